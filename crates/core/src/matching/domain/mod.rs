pub mod attendance_matcher;
pub mod face_selection;
pub mod verifier;
