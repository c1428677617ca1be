mod callback;
mod common;
mod job;
mod topology;
