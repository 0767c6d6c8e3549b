// src/lib.rs
// Point d'entrée de la bibliothèque : alarme (sommeil par ticks) du noyau
#![cfg_attr(not(test), no_std)] // Pas de bibliothèque standard hors tests

// Import de alloc pour les allocations dynamiques
extern crate alloc;

// Modules du noyau
pub mod boot;
pub mod config;
pub mod logger;
pub mod machine;
pub mod scheduler;
pub mod sync;
pub mod time;

pub use boot::{kernel_init, Kernel};
pub use config::AlarmConfig;
pub use machine::{Platform, SimMachine};
pub use scheduler::{ThreadHandle, ThreadId, ThreadState, ThreadSystem};
pub use sync::{InterruptControl, InterruptGuard, InterruptState};
pub use time::{
    AlarmError, AlarmResult, AlarmService, AlarmStatsSnapshot, DeadlineIndex, PeriodicTimer,
    Tick, TickSource, TimerHandler,
};
