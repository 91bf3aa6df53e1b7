//! 共享测试工具和辅助函数

#![allow(dead_code)]

use std::collections::HashSet;

use obd_wizard_core::types::ZoneId;
use obd_wizard_core::{NodeConfigForm, Topology};
use proptest::prelude::*;
use proptest::sample::Index;

/// 断言 `Result` 为 `Ok`，并解包返回内部值（失败则直接让测试失败）。
#[macro_export]
macro_rules! require_ok {
    ($expr:expr $(,)?) => {{
        let res = $expr;
        assert!(res.is_ok(), "expected Ok(..), got {res:?}");
        let Ok(val) = res else {
            return;
        };
        val
    }};
}

/// Edit applied directly to a [`Topology`]; zones are picked by index
#[derive(Debug, Clone)]
pub enum TopologyEdit {
    AddZone,
    RemoveZone(Index),
    Rename(Index, u8),
    Coordinator(Index, String),
    Servers(Index, Vec<String>),
}

/// Edit applied through a [`NodeConfigForm`]
#[derive(Debug, Clone)]
pub enum FormEdit {
    AddZone,
    RemoveZone(Index),
    Servers(Index, Vec<String>),
    Proxy(String),
    Console(String),
}

/// Address from a small space so collisions are frequent; some are malformed
pub fn address() -> impl Strategy<Value = String> {
    prop_oneof![
        9 => (1u8..10).prop_map(|n| format!("10.0.0.{n}")),
        1 => Just("10.0.0".to_string()),
    ]
}

pub fn addresses() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(address(), 0..4)
}

pub fn topology_edit() -> impl Strategy<Value = TopologyEdit> {
    prop_oneof![
        1 => Just(TopologyEdit::AddZone),
        1 => any::<Index>().prop_map(TopologyEdit::RemoveZone),
        1 => (any::<Index>(), 0u8..5).prop_map(|(i, n)| TopologyEdit::Rename(i, n)),
        1 => (any::<Index>(), address()).prop_map(|(i, a)| TopologyEdit::Coordinator(i, a)),
        2 => (any::<Index>(), addresses()).prop_map(|(i, a)| TopologyEdit::Servers(i, a)),
    ]
}

pub fn form_edit() -> impl Strategy<Value = FormEdit> {
    prop_oneof![
        1 => Just(FormEdit::AddZone),
        1 => any::<Index>().prop_map(FormEdit::RemoveZone),
        3 => (any::<Index>(), addresses()).prop_map(|(i, a)| FormEdit::Servers(i, a)),
        1 => address().prop_map(FormEdit::Proxy),
        1 => address().prop_map(FormEdit::Console),
    ]
}

pub fn zone_ids(topology: &Topology) -> Vec<ZoneId> {
    topology.zones().iter().map(|z| z.id.clone()).collect()
}

/// Zone picked by a generated index; a topology is never empty
pub fn pick(topology: &Topology, index: &Index) -> ZoneId {
    let ids = zone_ids(topology);
    ids[index.index(ids.len())].clone()
}

/// Structural invariants that hold after every edit
pub fn assert_invariants(topology: &Topology) {
    assert!(!topology.is_empty(), "at least one zone");

    let mut seen = HashSet::new();
    for zone in topology.zones() {
        for server in &zone.servers {
            assert!(seen.insert(server.clone()), "{server} assigned twice");
        }
        if let Some(rootservice) = &zone.rootservice {
            assert!(zone.servers.contains(rootservice), "{rootservice} not in zone");
        }
    }

    let mut names = HashSet::new();
    for zone in topology.zones() {
        assert!(names.insert(zone.name.as_str()), "zone name {} reused", zone.name);
    }

    let derived = topology.recompute_derived_fields();
    let concatenated: Vec<String> = topology
        .zones()
        .iter()
        .flat_map(|z| z.servers.iter().cloned())
        .collect();
    assert_eq!(derived.all_servers, concatenated);
}

/// Dependent fields after an edit
///
/// Every entry is in the pool or was typed by hand earlier; nothing the edit
/// took out of the pool survives; a non-empty pool always yields a proxy
/// default and exactly one console node.
pub fn assert_dependents_follow_pool(
    form: &NodeConfigForm,
    typed: &HashSet<String>,
    removed: &[String],
) {
    let pool = form.topology().all_servers();
    for value in form.proxy_servers().iter().chain(form.console_servers()) {
        assert!(
            pool.contains(value) || typed.contains(value),
            "{value} is neither in the pool nor typed by hand"
        );
        assert!(!removed.contains(value), "{value} left the pool but is still selected");
    }
    assert!(form.console_servers().len() <= 1);
    if !pool.is_empty() {
        assert!(!form.proxy_servers().is_empty(), "proxy default missing");
        assert_eq!(form.console_servers().len(), 1, "console default missing");
    }
}
