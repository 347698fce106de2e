use std::io::ErrorKind;

use bevy::{
    asset::{AssetLoader, LoadContext, io::Reader},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::{
    aggregate::proxy::SplatAssetHandle,
    splat::buffer::SplatBuffer,
};

#[derive(Default)]
pub struct SplatScenePlugin;
impl Plugin for SplatScenePlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<SplatScene>();
        app.init_asset::<SplatScene>();

        app.init_asset_loader::<SplatSceneLoader>();

        app.add_systems(Update, (spawn_scene,));
    }
}

#[derive(Clone, Debug, Default, Reflect, Serialize, Deserialize)]
pub struct SplatSceneEntry {
    pub asset_path: String,
    pub name: String,
    #[serde(default)]
    pub transform: Transform,
}

/// Manifest of splat assets merged into the aggregate, in listing order.
#[derive(Asset, Clone, Debug, Default, Reflect, Serialize, Deserialize)]
pub struct SplatScene {
    pub assets: Vec<SplatSceneEntry>,
    pub root: Option<String>,
}

impl SplatScene {
    /// Asset path of `entry` with `{root}` replaced by the manifest directory.
    pub fn resolve_path(&self, entry: &SplatSceneEntry) -> String {
        entry.asset_path.replace("{root}", self.root.as_deref().unwrap_or_default())
    }
}

#[derive(Component, Clone, Debug, Default, Reflect)]
#[require(Transform)]
pub struct SplatSceneHandle(pub Handle<SplatScene>);

#[derive(Component, Clone, Debug, Default, Reflect)]
pub struct SplatSceneLoaded;

fn spawn_scene(
    mut commands: Commands,
    scene_handles: Query<(Entity, &SplatSceneHandle, &Transform), Without<SplatSceneLoaded>>,
    asset_server: Res<AssetServer>,
    scenes: Res<Assets<SplatScene>>,
) {
    for (entity, scene_handle, transform) in scene_handles.iter() {
        let Some(scene) = scenes.get(&scene_handle.0) else {
            continue;
        };

        // node transforms are read from the proxies' local `Transform`
        if *transform != Transform::IDENTITY {
            warn!(?entity, "splat scene root transform is not applied to its proxies");
        }

        let proxies = scene
            .assets
            .iter()
            .map(|entry| {
                (
                    SplatAssetHandle(asset_server.load::<SplatBuffer>(scene.resolve_path(entry))),
                    Name::new(entry.name.clone()),
                    entry.transform,
                )
            })
            .collect::<Vec<_>>();

        debug!(?entity, assets = proxies.len(), "spawning splat scene proxies");

        commands
            .entity(entity)
            .with_children(move |builder| {
                for proxy in proxies {
                    builder.spawn(proxy);
                }
            })
            .insert(SplatSceneLoaded);
    }
}

#[derive(Default)]
pub struct SplatSceneLoader;

impl AssetLoader for SplatSceneLoader {
    type Asset = SplatScene;
    type Settings = ();
    type Error = std::io::Error;

    async fn load(
        &self,
        reader: &mut dyn Reader,
        _: &Self::Settings,
        load_context: &mut LoadContext<'_>,
    ) -> Result<Self::Asset, Self::Error> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;

        match load_context.path().extension() {
            Some(ext) if ext == "json" => {
                let mut scene: SplatScene = serde_json::from_slice(&bytes)
                    .map_err(|err| std::io::Error::new(ErrorKind::InvalidData, err))?;

                scene.root = load_context
                    .path()
                    .parent()
                    .map(|parent| parent.to_string_lossy().to_string());

                Ok(scene)
            }
            _ => Err(std::io::Error::other("only .json supported")),
        }
    }

    fn extensions(&self) -> &[&str] {
        &["json"]
    }
}
