use super::*;

fn ep(host: &str, port: u16) -> Endpoint {
    Endpoint::new(host, port)
}

#[test]
fn ballot_ordering_is_monotonic() {
    let b0 = Ballot::ZERO;
    let b1 = b0.next();
    let b2 = b1.next();
    assert!(b0 < b1);
    assert!(b1 < b2);
    assert_eq!(b1.as_u64(), 1);
}

#[test]
fn decree_invalid_is_sentinel() {
    assert!(Decree::INVALID.is_invalid());
    assert!(!Decree::ZERO.is_invalid());
    assert_eq!(Decree::default(), Decree::INVALID);
    assert_eq!(Decree::new(4).next(), Decree::new(5));
}

#[test]
fn endpoint_invalid_sentinel_round_trips() {
    let invalid = Endpoint::invalid();
    assert!(invalid.is_invalid());
    assert_eq!(invalid, Endpoint::default());
    assert!(!ep("h", 1).is_invalid());
}

#[test]
fn remove_node_preserves_order_and_reports_removal() {
    let mut seq = vec![ep("a", 1), ep("b", 2), ep("c", 3)];
    assert!(PartitionConfiguration::remove_node(&ep("b", 2), &mut seq));
    assert_eq!(seq, vec![ep("a", 1), ep("c", 3)]);

    // removing again is a no-op and reports false
    assert!(!PartitionConfiguration::remove_node(&ep("b", 2), &mut seq));
    assert_eq!(seq, vec![ep("a", 1), ep("c", 3)]);
}

fn sample_config() -> PartitionConfiguration {
    let mut cfg = PartitionConfiguration::new(Gpid::new(1, 0), "simple_kv", Ballot::new(2));
    cfg.primary = ep("primary", 1);
    cfg.secondaries = vec![ep("secondary", 2)];
    cfg.drop_outs = vec![ep("learner", 3)];
    cfg
}

#[test]
fn project_yields_primary_for_primary_endpoint() {
    let cfg = sample_config();
    let projection = cfg.project(&ep("primary", 1), false);
    assert_eq!(projection.status, Status::Primary);
    assert_eq!(projection.ballot, cfg.ballot);
    assert_eq!(projection.gpid, cfg.gpid);
}

#[test]
fn project_yields_secondary_for_secondary_endpoint() {
    let cfg = sample_config();
    assert_eq!(cfg.project(&ep("secondary", 2), false).status, Status::Secondary);
}

#[test]
fn project_yields_potential_secondary_only_while_learning() {
    let cfg = sample_config();
    assert_eq!(
        cfg.project(&ep("learner", 3), true).status,
        Status::PotentialSecondary
    );
    // Same drop_outs membership, but not locally believed to be learning:
    // falls through to Inactive per §3.
    assert_eq!(cfg.project(&ep("learner", 3), false).status, Status::Inactive);
}

#[test]
fn project_yields_inactive_for_unknown_endpoint() {
    let cfg = sample_config();
    assert_eq!(cfg.project(&ep("stranger", 9), true).status, Status::Inactive);
}

#[test]
fn project_is_stable_across_repeated_calls() {
    let cfg = sample_config();
    let first = cfg.project(&ep("secondary", 2), false);
    let second = cfg.project(&ep("secondary", 2), false);
    assert_eq!(first, second);
}

#[test]
fn disjoint_node_sets_invariant_detects_violations() {
    let mut cfg = sample_config();
    assert!(cfg.has_disjoint_node_sets());

    cfg.drop_outs.push(ep("secondary", 2));
    assert!(!cfg.has_disjoint_node_sets());
}

#[test]
fn disjoint_node_sets_invariant_ignores_invalid_primary() {
    let mut cfg = sample_config();
    cfg.primary = Endpoint::invalid();
    assert!(cfg.has_disjoint_node_sets());
}

#[test]
fn status_and_configuration_type_display_match_wire_names() {
    assert_eq!(Status::PotentialSecondary.to_string(), "POTENTIAL_SECONDARY");
    assert_eq!(
        ConfigurationType::DowngradeToInactive.to_string(),
        "CT_DOWNGRADE_TO_INACTIVE"
    );
    assert_eq!(ErrorCode::Success.to_string(), "ERR_SUCCESS");
}
