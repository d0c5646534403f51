mod helper;
mod notes;
mod search;
