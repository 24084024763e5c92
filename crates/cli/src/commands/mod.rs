pub mod dump;
pub mod init;
pub mod inspect;
pub mod restore;
pub mod run;
pub mod verify;
