use std::path::Path;

use anyhow::Context;

use crate::annotation::model::Annotation;
use crate::annotation::store::AnnotationStore;
use crate::foundation::core::Canvas;
use crate::foundation::error::{FramemarkError, FramemarkResult};
use crate::package::model::{AnnotationPackage, PackagedAnnotation};
use crate::scene::graph::Scene;
use crate::scene::shape::Shape;

/// Pack every annotation in `store` with its scene shape.
#[tracing::instrument(skip(store, scene), fields(count = store.len()))]
pub fn export_package(
    store: &AnnotationStore,
    scene: &Scene,
    canvas: Canvas,
    exported_at: u64,
) -> FramemarkResult<AnnotationPackage> {
    let mut pkg = AnnotationPackage::new(canvas, exported_at);
    for a in store.annotations() {
        let shape = scene.shape(&a.id).ok_or_else(|| {
            FramemarkError::package(format!("annotation '{}' has no shape", a.id))
        })?;
        pkg.annotations.push(PackagedAnnotation::new(a, shape.clone()));
    }
    Ok(pkg)
}

/// Validate `pkg` and rescale it into `target`, yielding insertable parts.
///
/// Nothing is produced unless the whole package is valid.
#[tracing::instrument(skip(pkg), fields(count = pkg.annotations.len()))]
pub fn prepare_import(
    mut pkg: AnnotationPackage,
    target: Canvas,
) -> FramemarkResult<Vec<(Annotation, Shape)>> {
    pkg.validate()?;
    if pkg.source_dimensions != target {
        tracing::debug!(
            from_w = pkg.source_dimensions.width,
            from_h = pkg.source_dimensions.height,
            to_w = target.width,
            to_h = target.height,
            "rescaling package"
        );
    }
    pkg.rescale_to(target);
    if let Some(a) = pkg
        .annotations
        .iter()
        .find(|a| !a.shape_data.is_finite() || !a.shape_data.has_finite_extent())
    {
        return Err(FramemarkError::package(format!(
            "annotation '{}' overflows the target canvas",
            a.id
        )));
    }
    Ok(pkg
        .annotations
        .into_iter()
        .map(PackagedAnnotation::into_parts)
        .collect())
}

/// Serialize as pretty JSON.
pub fn to_json(pkg: &AnnotationPackage) -> FramemarkResult<String> {
    Ok(serde_json::to_string_pretty(pkg)?)
}

/// Parse JSON. Malformed input is a package error.
pub fn from_json(s: &str) -> FramemarkResult<AnnotationPackage> {
    serde_json::from_str(s).map_err(|e| FramemarkError::package(format!("malformed package: {e}")))
}

/// Read and parse a package file.
pub fn read_package(path: &Path) -> FramemarkResult<AnnotationPackage> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("read package '{}'", path.display()))?;
    from_json(&s)
}

/// Write a package file.
pub fn write_package(path: &Path, pkg: &AnnotationPackage) -> FramemarkResult<()> {
    let s = to_json(pkg)?;
    std::fs::write(path, s).with_context(|| format!("write package '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/package/codec.rs"]
mod tests;
