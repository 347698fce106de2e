use std::collections::{
    HashMap,
    HashSet,
};

use bevy::prelude::*;

use crate::{
    aggregate::SplatAggregator,
    error::SplatError,
    node::NodeHandle,
    splat::buffer::SplatBuffer,
};


/// Proxy entity for one splat asset. Its `Transform` becomes the node's world transform.
#[derive(Component, Clone, Debug, Default, Reflect)]
#[require(Transform)]
#[reflect(Component)]
pub struct SplatAssetHandle(pub Handle<SplatBuffer>);

impl SplatAssetHandle {
    pub fn handle(&self) -> &Handle<SplatBuffer> {
        &self.0
    }
}

/// Node the proxy was merged into.
#[derive(Component, Clone, Copy, Debug, Reflect)]
#[reflect(Component)]
pub struct SplatNode(pub NodeHandle);

#[derive(Component, Clone, Debug, Default, Reflect)]
#[reflect(Component)]
pub struct SplatAssetFailed;


#[derive(Event, Clone, Copy, Debug)]
pub struct SplatAssetMerged {
    pub entity: Entity,
    pub handle: NodeHandle,
    pub splat_count: u32,
}

#[derive(Event, Clone, Debug)]
pub struct SplatMergeFailed {
    pub entity: Entity,
    pub error: SplatError,
}


#[derive(Debug, Hash, PartialEq, Eq, Clone, SystemSet)]
pub enum SplatAggregateSystems {
    Merge,
    SyncTransforms,
}


/// Moves loaded splat assets out of `Assets<SplatBuffer>` and into the aggregate.
///
/// Proxies sharing one handle are merged as separate nodes from the same
/// buffer. A proxy whose asset was consumed on an earlier frame is marked
/// `SplatAssetFailed`.
#[allow(clippy::type_complexity)]
pub fn merge_loaded_splat_assets(
    mut commands: Commands,
    mut aggregator: ResMut<SplatAggregator>,
    mut buffers: ResMut<Assets<SplatBuffer>>,
    mut consumed: Local<HashSet<AssetId<SplatBuffer>>>,
    pending: Query<
        (Entity, &SplatAssetHandle, &Transform),
        (Without<SplatNode>, Without<SplatAssetFailed>),
    >,
    mut merged: EventWriter<SplatAssetMerged>,
    mut failed: EventWriter<SplatMergeFailed>,
) {
    let mut groups: Vec<(AssetId<SplatBuffer>, Vec<(Entity, Mat4)>)> = Vec::new();
    let mut group_of: HashMap<AssetId<SplatBuffer>, usize> = HashMap::new();

    for (entity, asset, transform) in &pending {
        let id = asset.handle().id();
        let index = *group_of.entry(id).or_insert_with(|| {
            groups.push((id, Vec::new()));
            groups.len() - 1
        });
        groups[index].1.push((entity, transform.compute_matrix()));
    }

    for (id, proxies) in groups {
        let Some(buffer) = buffers.remove(id) else {
            if consumed.contains(&id) {
                for (entity, _) in proxies {
                    warn!(?entity, "splat asset already consumed by another merge");
                    commands.entity(entity).insert(SplatAssetFailed);
                }
            }
            continue;
        };
        consumed.insert(id);

        let last = proxies.len() - 1;
        let mut shared = Some(buffer);

        for (i, (entity, world_transform)) in proxies.into_iter().enumerate() {
            let source = if i == last {
                shared.take()
            } else {
                shared.clone()
            };
            let Some(source) = source else {
                break;
            };

            let splat_count = source.splat_count;
            let source = source.with_world_transform(world_transform);

            match aggregator.add_asset(source) {
                Ok(handle) => {
                    info!(
                        ?entity,
                        node = handle.node().0,
                        splat_count,
                        total_splats = aggregator.splat_count(),
                        "splat asset merged"
                    );

                    commands.entity(entity).insert(SplatNode(handle));
                    merged.write(SplatAssetMerged {
                        entity,
                        handle,
                        splat_count,
                    });
                }
                Err(error) => {
                    warn!(?entity, %error, "failed to merge splat asset");

                    commands.entity(entity).insert(SplatAssetFailed);
                    failed.write(SplatMergeFailed {
                        entity,
                        error,
                    });
                }
            }
        }
    }
}

/// Pushes proxy `Transform` changes, e.g. gizmo drags, into the node transform table.
pub fn sync_node_transforms(
    mut aggregator: ResMut<SplatAggregator>,
    moved: Query<(Entity, &SplatNode, &Transform), Changed<Transform>>,
) {
    for (entity, node, transform) in &moved {
        if let Err(error) = aggregator.set_node_transform(node.0, transform.compute_matrix()) {
            debug!(?entity, %error, "ignoring transform of stale splat node");
        }
    }
}
