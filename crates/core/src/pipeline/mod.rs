pub mod cluster_faces_use_case;
pub mod face_engine;
pub mod infrastructure;
pub mod register_identity_use_case;
pub mod take_attendance_use_case;
pub mod verify_faces_use_case;
