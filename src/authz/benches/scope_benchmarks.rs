/// Benchmarks for scope resolution and subtree computation
///
/// Measures performance of:
/// - Subtree lookup by path index vs. child-link walk
/// - Scope resolution over growing role sets
/// - Full filter building through the engine (cached snapshot)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use orgscope_authz::{
    config::EngineConfig,
    org::{OrgTree, OrgUnit, OrgUnitType, SubtreeIndex},
    repository::{ConfigData, InMemoryConfigRepository, StaticSubordinates},
    scope::{RoleScopeAssignment, ScopeResolver, ScopeRuleStore, ScopeType},
    types::Role,
    AccessEngine, ResourceDescriptor, User,
};
use std::sync::Arc;

/// Balanced tree with `fanout` children per unit, `levels` deep
fn balanced_units(fanout: i64, levels: u32) -> Vec<OrgUnit> {
    let mut units = vec![OrgUnit::new(1, "root", OrgUnitType::Company)];
    let mut frontier = vec![1];
    let mut next_id = 2;

    for level in 1..levels {
        let unit_type = match level {
            1 => OrgUnitType::BusinessUnit,
            2 => OrgUnitType::Department,
            _ => OrgUnitType::Team,
        };
        let mut next_frontier = Vec::new();
        for &parent in &frontier {
            for _ in 0..fanout {
                units.push(OrgUnit::new(next_id, format!("u{}", next_id), unit_type).with_parent(parent));
                next_frontier.push(next_id);
                next_id += 1;
            }
        }
        frontier = next_frontier;
    }

    units
}

fn bench_subtree(c: &mut Criterion) {
    let mut group = c.benchmark_group("subtree");

    for (name, fanout, levels) in [("small", 4, 3), ("medium", 6, 4), ("large", 8, 5)] {
        let plain = OrgTree::build(balanced_units(fanout, levels));
        let with_paths = OrgTree::build(plain.materialize_paths());
        let walk_index = SubtreeIndex::new(Arc::new(plain));
        let path_index = SubtreeIndex::new(Arc::new(with_paths));

        group.bench_with_input(BenchmarkId::new("path_index", name), &path_index, |b, index| {
            b.iter(|| index.descendant_ids(black_box(2)))
        });
        group.bench_with_input(BenchmarkId::new("walk", name), &walk_index, |b, index| {
            b.iter(|| index.descendant_ids(black_box(2)))
        });
    }

    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    let scopes = [ScopeType::Own, ScopeType::Team, ScopeType::Department, ScopeType::Project];

    for role_count in [1usize, 5, 20] {
        let roles = (0..role_count).map(|i| Role::new(i as i64, format!("role{}", i)));
        let assignments =
            (0..role_count).map(|i| RoleScopeAssignment::new(i as i64, "contract", scopes[i % scopes.len()]));
        let store = ScopeRuleStore::build(roles, assignments, &EngineConfig::default());
        let user = (0..role_count).fold(User::new(1), |u, i| u.with_role(format!("role{}", i)));

        group.bench_with_input(BenchmarkId::from_parameter(role_count), &user, |b, user| {
            let resolver = ScopeResolver::new(&store);
            b.iter(|| resolver.resolve(black_box(user), "contract"))
        });
    }

    group.finish();
}

fn bench_engine_filter(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let plain = OrgTree::build(balanced_units(6, 4));

    let repo = InMemoryConfigRepository::from_data(ConfigData {
        org_units: plain.materialize_paths(),
        roles: vec![Role::new(1, "legal_dept")],
        scope_assignments: vec![RoleScopeAssignment::new(1, "contract", ScopeType::BusinessUnit)],
    });
    let engine = AccessEngine::new(
        EngineConfig::default(),
        Arc::new(repo),
        Arc::new(StaticSubordinates::new()),
    )
    .unwrap();

    let user = User::new(10).with_role("legal_dept").primary_member_of(50);
    let descriptor = ResourceDescriptor::new("contract").with_org_field("org_unit_id");

    c.bench_function("engine_build_filter", |b| {
        b.to_async(&runtime)
            .iter(|| async { engine.build_filter(black_box(&user), "contract", &descriptor).await.unwrap() })
    });
}

criterion_group!(benches, bench_subtree, bench_resolve, bench_engine_filter);
criterion_main!(benches);
