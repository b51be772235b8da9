// watchlog state managers
// Managers own persistent state: the history table.

pub mod history_store;
