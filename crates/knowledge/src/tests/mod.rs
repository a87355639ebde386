//! Scenario tests across extractor, client, ingestion and chat.

mod fakes;
