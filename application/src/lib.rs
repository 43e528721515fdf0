//! Application layer for reader-panel
//!
//! Defines the ports the orchestration depends on (inference gateway,
//! memory store, progress notifier, event relay) and the use cases that
//! drive a panel session: reader fan-out, memory write/read, the
//! focus-group conversation engine, and executive evaluation.

pub mod ports;
pub mod use_cases;

pub use ports::{
    event_relay::{EventRelay, PanelEvent},
    gateway::{ChatMessage, GatewayError, InferenceGateway, Role, StreamHandle},
    memory_store::{MemoryStore, StoreError},
    progress::{NoProgress, ProgressNotifier},
};
pub use use_cases::{
    memorize::MemorizeUseCase,
    recall::RecallUseCase,
    run_executive::{RunExecutiveError, RunExecutiveUseCase},
    run_focus_group::{FocusGroupError, FocusGroupInput, RunFocusGroupUseCase},
    run_panel::{PanelReport, RunPanelError, RunPanelInput, RunPanelUseCase},
};
