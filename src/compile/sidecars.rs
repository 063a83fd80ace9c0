//! Auxiliary outputs the surrounding driver writes next to the archive:
//! the partial Info.plist fragment and the dependency-info record.

use crate::compile::CompileOptions;
use crate::error::Result;
use crate::filesystem::Filesystem;
use serde_json::{json, Map, Value};
use std::path::Path;

/// The partial Info.plist fragment, emitted as JSON: the keys the build
/// system merges into the app's Info.plist for the assets this compile
/// produced.
pub fn write_partial_info_plist(
    filesystem: &dyn Filesystem,
    path: &Path,
    options: &CompileOptions,
) -> Result<()> {
    let mut dict = Map::new();
    if let Some(app_icon) = &options.app_icon {
        dict.insert("CFBundleIconName".into(), Value::String(app_icon.clone()));
    }
    if let Some(launch_image) = &options.launch_image {
        dict.insert(
            "UILaunchImageFile".into(),
            Value::String(launch_image.clone()),
        );
    }
    if let Some(target_name) = &options.target_name {
        dict.insert("TargetName".into(), Value::String(target_name.clone()));
    }

    let bytes = serde_json::to_vec_pretty(&Value::Object(dict))
        .map_err(|e| crate::error::CompileError::Invalid(e.to_string()))?;
    filesystem.write(path, &bytes)?;
    Ok(())
}

/// The dependency-info record: the inputs this run consumed and the
/// outputs it produced, for the build system's incremental bookkeeping.
pub fn write_dependency_info(
    filesystem: &dyn Filesystem,
    path: &Path,
    inputs: &[&Path],
    outputs: &[&Path],
) -> Result<()> {
    let value = json!({
        "version": "acbuild-1",
        "inputs": inputs.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
        "outputs": outputs.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
    });
    let bytes = serde_json::to_vec_pretty(&value)
        .map_err(|e| crate::error::CompileError::Invalid(e.to_string()))?;
    filesystem.write(path, &bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::DefaultFilesystem;

    #[test]
    fn partial_info_plist_carries_icon_keys() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("partial.plist");
        let options = CompileOptions {
            app_icon: Some("AppIcon".into()),
            launch_image: Some("Launch".into()),
            ..Default::default()
        };
        write_partial_info_plist(&DefaultFilesystem, &path, &options).unwrap();

        let value: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(value["CFBundleIconName"], "AppIcon");
        assert_eq!(value["UILaunchImageFile"], "Launch");
    }

    #[test]
    fn dependency_info_lists_both_sides() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("deps.json");
        write_dependency_info(
            &DefaultFilesystem,
            &path,
            &[Path::new("Assets.xcassets")],
            &[Path::new("out/Assets.car")],
        )
        .unwrap();

        let value: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(value["inputs"][0], "Assets.xcassets");
        assert_eq!(value["outputs"][0], "out/Assets.car");
    }
}
