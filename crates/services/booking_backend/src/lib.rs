// --- File: crates/services/booking_backend/src/lib.rs ---
pub mod app; // Router assembly
