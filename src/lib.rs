pub mod aggregate;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod on_ice;
pub mod pbp;
pub mod report;
pub mod season;
pub mod sequences;
pub mod synthetic;
pub mod win_prob;
pub mod window;
pub mod xg;
