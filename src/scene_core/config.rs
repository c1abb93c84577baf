use std::ffi::{OsStr, OsString};

use anyhow::{anyhow, Result};

pub const DEFAULT_ASSET_ROOT: &str = "assets";

/// Where to find assets. Scene behavior itself is not configurable.
#[derive(Clone, Debug)]
pub struct LaunchConfig {
    pub asset_root: String,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            asset_root: DEFAULT_ASSET_ROOT.to_string(),
        }
    }
}

impl LaunchConfig {
    pub fn from_env_args() -> Result<Self> {
        Self::from_iter(
            std::env::args_os().skip(1),
            std::env::var_os("CAR_ROAD_ASSETS"),
        )
    }

    fn from_iter<I>(args: I, env_asset_root: Option<OsString>) -> Result<Self>
    where
        I: IntoIterator<Item = OsString>,
    {
        let mut config = Self::default();

        if let Some(root) = non_empty(env_asset_root.as_deref()) {
            config.asset_root = root;
        }

        let mut iter = args.into_iter();
        while let Some(arg) = iter.next() {
            let arg_str = arg.to_string_lossy();
            match arg_str.as_ref() {
                "--assets" => {
                    let Some(value) = iter.next() else {
                        return Err(anyhow!("--assets requires a directory"));
                    };
                    config.asset_root = value.to_string_lossy().to_string();
                }
                other => log::warn!("ignoring unknown argument {other:?}"),
            }
        }

        Ok(config)
    }

    /// Join an asset-relative path onto the root with a forward slash, which
    /// works both as a native path and as a URL.
    pub fn asset_path(&self, relative: &str) -> String {
        let root = self.asset_root.trim_end_matches('/');
        if root.is_empty() {
            relative.to_string()
        } else {
            format!("{root}/{relative}")
        }
    }
}

fn non_empty(value: Option<&OsStr>) -> Option<String> {
    value
        .map(|v| v.to_string_lossy().trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::LaunchConfig;
    use std::ffi::OsString;

    #[test]
    fn default_root_is_assets() {
        let parsed = LaunchConfig::from_iter(Vec::<OsString>::new(), None).unwrap();
        assert_eq!(parsed.asset_root, "assets");
        assert_eq!(
            parsed.asset_path("texture/grass.jpg"),
            "assets/texture/grass.jpg"
        );
    }

    #[test]
    fn env_overrides_default_and_cli_overrides_env() {
        let parsed =
            LaunchConfig::from_iter(Vec::<OsString>::new(), Some(OsString::from("/srv/demo")))
                .unwrap();
        assert_eq!(parsed.asset_root, "/srv/demo");

        let args = vec![OsString::from("--assets"), OsString::from("public/")];
        let parsed = LaunchConfig::from_iter(args, Some(OsString::from("/srv/demo"))).unwrap();
        assert_eq!(parsed.asset_path("model/car/scene.gltf"), "public/model/car/scene.gltf");
    }

    #[test]
    fn blank_env_is_ignored() {
        let parsed =
            LaunchConfig::from_iter(Vec::<OsString>::new(), Some(OsString::from("  "))).unwrap();
        assert_eq!(parsed.asset_root, "assets");
    }

    #[test]
    fn assets_flag_requires_a_value() {
        let args = vec![OsString::from("--assets")];
        assert!(LaunchConfig::from_iter(args, None).is_err());
    }

    #[test]
    fn empty_root_yields_relative_paths() {
        let config = LaunchConfig {
            asset_root: String::new(),
        };
        assert_eq!(config.asset_path("texture/road.jpg"), "texture/road.jpg");
    }
}
