pub mod angle;
pub mod degrade;
pub mod run;
