//! rugwatch - New coin screener and alerter for Rugplay
//!
//! Screens freshly listed coins through an ordered, short-circuiting filter
//! pipeline and pushes alerts for survivors. Also watches held positions for
//! a collapsing top-holder gap.
//!
//! # Modules
//!
//! - `domain`: Core types (InstrumentSnapshot, HolderSnapshot, KeyRotator, AlertEvent)
//! - `ports`: Trait abstractions (MarketDataPort, AlertSink, RankingPort)
//! - `strategy`: Filter profiles, momentum and the candidate pipeline
//! - `adapters`: External implementations (Rugplay, ntfy, Groq, chat, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Scheduler, position monitor, dispatcher and scan service

pub mod domain;
pub mod ports;
pub mod strategy;
pub mod adapters;
pub mod config;
pub mod application;
