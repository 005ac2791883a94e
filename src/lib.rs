//! # Notekeeper Telegram Bot
//!
//! A Telegram bot that keeps short personal notes per user. Notes are added,
//! listed, edited and deleted through a reply keyboard and stored in a JSON
//! file or a PostgreSQL database.

pub mod bot;
pub mod config;
pub mod dialogue;
pub mod localization;
pub mod note_model;
pub mod storage;
