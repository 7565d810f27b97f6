#![allow(dead_code)]

pub mod archive;
pub mod git;
pub mod host;
