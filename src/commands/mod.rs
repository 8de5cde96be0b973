pub type CmdResult<T> = conveyor::Result<(T, i32)>;

pub(crate) struct GlobalArgs {}

pub mod check;
pub mod init;
pub mod logs;
pub mod ls;
pub mod run;
pub mod trigger;
