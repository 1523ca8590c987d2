mod common;
mod competency;
mod jobs;
mod trend;
