pub mod storage;
pub mod options;
