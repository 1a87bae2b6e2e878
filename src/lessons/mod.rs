//! Lesson content: cards, file I/O and the external generator

pub mod card;
pub mod generator;

pub use card::{default_lessons, load_json, parse_card, save_json, validate, LessonCard};
pub use generator::{parse_generated, LessonGenerator, NatsLessonGenerator};
