//! Test suite for the Nutcrack Discord bot
//! Drives the music core through its public API with recording fakes

mod common;
mod integration;
