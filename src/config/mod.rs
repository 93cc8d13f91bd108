pub mod jobs;
pub mod load;
pub mod model;
