pub mod router;
pub mod supervisor;
