//! Test modules for the agent buffer
//!
//! Organised by functional area: the circular store, the flow state
//! machine, the producer path, lifecycle control and the dispatch loop.

mod dispatch;
