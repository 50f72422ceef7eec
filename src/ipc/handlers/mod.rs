pub mod backup;
pub mod calc;
pub mod core;
pub mod semesters;
pub mod setup;
pub mod subjects;
pub mod ues;
pub mod users;
pub mod years;
