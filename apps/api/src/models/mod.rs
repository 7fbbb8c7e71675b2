pub mod feedback;
pub mod interview;
pub mod interviewer;
pub mod phone_number;
pub mod response;
