//! Storage for the note key space
//!
//! A single JSON file mirrors the in-memory map; every mutation rewrites it whole.

pub mod note_store;

pub use note_store::{Entry, Listing, LoadOutcome, NoteStore};
