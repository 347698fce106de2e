use bevy::prelude::*;

pub use aggregate::{
    AggregateSettings,
    AggregateSplatSet,
    NodeRange,
    ShMergePolicy,
    SplatAggregator,
    proxy::{
        SplatAggregateSystems,
        SplatAssetFailed,
        SplatAssetHandle,
        SplatAssetMerged,
        SplatMergeFailed,
        SplatNode,
    },
};
pub use error::{
    ShapeError,
    SplatError,
};
pub use node::{
    NodeHandle,
    NodeId,
    NodeIdAllocator,
    NodeTransforms,
};
pub use splat::{
    buffer::SplatBuffer,
    packed::{
        ATTRIBUTE_STRIDE,
        PackedSplat,
    },
    rand::{
        random_splat_buffer,
        random_splats,
    },
};

use aggregate::proxy::{
    merge_loaded_splat_assets,
    sync_node_transforms,
};
use io::{
    loader::SplatBufferLoader,
    scene::SplatScenePlugin,
};

pub mod aggregate;
pub mod error;
pub mod io;
pub mod node;
pub mod splat;


#[derive(Default)]
pub struct SplatAggregatePlugin {
    pub settings: AggregateSettings,
}

impl Plugin for SplatAggregatePlugin {
    fn build(&self, app: &mut App) {
        app.init_asset::<SplatBuffer>();
        app.init_asset_loader::<SplatBufferLoader>();

        app.register_type::<AggregateSettings>();
        app.register_type::<SplatAssetHandle>();
        app.register_type::<SplatNode>();
        app.register_type::<SplatAssetFailed>();

        app.insert_resource(self.settings.clone());
        app.insert_resource(SplatAggregator::new(self.settings.clone()));

        app.add_event::<SplatAssetMerged>();
        app.add_event::<SplatMergeFailed>();

        app.configure_sets(
            Update,
            (
                SplatAggregateSystems::Merge,
                SplatAggregateSystems::SyncTransforms,
            ).chain(),
        );

        app.add_systems(
            Update,
            (
                merge_loaded_splat_assets.in_set(SplatAggregateSystems::Merge),
                sync_node_transforms.in_set(SplatAggregateSystems::SyncTransforms),
            ),
        );

        app.add_plugins(SplatScenePlugin);
    }
}
