pub mod init;
pub mod results;
pub mod run;
pub mod status;
