//! End-to-end tests for the interop gateway over real loopback sockets.

#[cfg(test)]
mod support;

#[cfg(test)]
mod gateway;

#[cfg(test)]
mod simple_e2e;

#[cfg(test)]
mod triage_e2e;

#[cfg(test)]
mod scenario_tree;
