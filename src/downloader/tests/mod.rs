//! Behavior tests for the batch download engine, driven by the in-memory
//! document source fixture.
