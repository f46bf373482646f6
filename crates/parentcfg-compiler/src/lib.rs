//! parentcfg Compiler
//!
//! Compiles a delivery-service catalog, cache topologies and parent
//! candidates into the parent.config file of one cache server.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      ParentConfigInput (snapshot)                │
//! └──────────────────────────────────────────────────────────────────┘
//!            │                                   │
//!            ▼                                   ▼
//! ┌────────────────────┐              ┌────────────────────┐
//! │ Topology Resolver  │              │ Capability Matcher │
//! └────────────────────┘              └────────────────────┘
//!            │                                   │
//!            └─────────────────┬─────────────────┘
//!                              ▼
//!                  ┌────────────────────────┐   ┌──────────────────┐
//!                  │ Parent Candidate       │   │ qstring Policy   │
//!                  │ Selector               │   │ Resolver         │
//!                  └────────────────────────┘   └──────────────────┘
//!                              │                         │
//!                              └────────────┬────────────┘
//!                                           ▼
//!                  ┌─────────────────────────────────────────────┐
//!                  │ Line Emitter ─► Config Assembler ─► text    │
//!                  └─────────────────────────────────────────────┘
//! ```
//!
//! Compilation is a pure function of its input: no I/O, no shared state.
//! Different servers can be compiled concurrently from the same snapshot.

#![warn(clippy::all)]

pub mod assembler;
pub mod capability;
pub mod emitter;
pub mod qstring;
pub mod selector;
pub mod topology;

pub use assembler::{
    compile, CompileOptions, ConfigAssembler, ParentConfigInput, ParentDotConfig, SkipReason,
    SkippedDeliveryService,
};
pub use emitter::{LineEmitter, ParentDirective, SyntaxFamily};
pub use qstring::resolve_qstring;
pub use selector::SelectedParents;
pub use topology::TopologyResolution;
