mod inheritance;
mod merge;
mod orchestrator;
mod support;
mod validation;
