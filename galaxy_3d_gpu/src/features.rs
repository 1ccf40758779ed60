/// Device extension and feature resolution
///
/// Each request names a feature, how badly it is wanted and the features it
/// depends on. A feature is enabled only when the device supports it and
/// every dependency resolves as enabled.

use std::collections::BTreeSet;
use rustc_hash::FxHashMap;
use crate::error::{Error, Result};
use crate::{engine_debug, engine_error, engine_info, engine_warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeviceFeature {
    Swapchain,
    Maintenance3,
    PushDescriptor,
    DynamicRendering,
    DepthStencilResolve,
    CreateRenderPass2,
    DescriptorIndexing,
    PortabilitySubset,
}

impl DeviceFeature {
    /// Device extension that provides the feature
    pub fn extension_name(&self) -> &'static str {
        match self {
            DeviceFeature::Swapchain => "VK_KHR_swapchain",
            DeviceFeature::Maintenance3 => "VK_KHR_maintenance3",
            DeviceFeature::PushDescriptor => "VK_KHR_push_descriptor",
            DeviceFeature::DynamicRendering => "VK_KHR_dynamic_rendering",
            DeviceFeature::DepthStencilResolve => "VK_KHR_depth_stencil_resolve",
            DeviceFeature::CreateRenderPass2 => "VK_KHR_create_renderpass2",
            DeviceFeature::DescriptorIndexing => "VK_EXT_descriptor_indexing",
            DeviceFeature::PortabilitySubset => "VK_KHR_portability_subset",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Device creation fails without it
    Required,
    /// Disabled with a warning when missing
    Optional,
    /// Enabled silently when present (e.g. portability subset)
    OnlyIfSupported,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureRequest {
    pub feature: DeviceFeature,
    pub requirement: Requirement,
    pub dependencies: Vec<DeviceFeature>,
}

impl FeatureRequest {
    pub fn new(feature: DeviceFeature, requirement: Requirement) -> Self {
        Self { feature, requirement, dependencies: Vec::new() }
    }

    pub fn depends_on(mut self, feature: DeviceFeature) -> Self {
        self.dependencies.push(feature);
        self
    }
}

/// Requests used when the application does not provide its own list
pub fn default_feature_requests() -> Vec<FeatureRequest> {
    vec![
        FeatureRequest::new(DeviceFeature::Swapchain, Requirement::Required),
        FeatureRequest::new(DeviceFeature::Maintenance3, Requirement::Optional),
        FeatureRequest::new(DeviceFeature::PushDescriptor, Requirement::Optional),
        FeatureRequest::new(DeviceFeature::DynamicRendering, Requirement::Optional)
            .depends_on(DeviceFeature::DepthStencilResolve),
        FeatureRequest::new(DeviceFeature::DepthStencilResolve, Requirement::Optional)
            .depends_on(DeviceFeature::CreateRenderPass2),
        FeatureRequest::new(DeviceFeature::CreateRenderPass2, Requirement::Optional),
        FeatureRequest::new(DeviceFeature::DescriptorIndexing, Requirement::OnlyIfSupported)
            .depends_on(DeviceFeature::Maintenance3),
        FeatureRequest::new(DeviceFeature::PortabilitySubset, Requirement::OnlyIfSupported),
    ]
}

/// Features enabled on a device
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureSet {
    enabled: BTreeSet<DeviceFeature>,
}

impl FeatureSet {
    pub fn from_features(features: impl IntoIterator<Item = DeviceFeature>) -> Self {
        Self { enabled: features.into_iter().collect() }
    }

    pub fn is_enabled(&self, feature: DeviceFeature) -> bool {
        self.enabled.contains(&feature)
    }

    pub fn iter(&self) -> impl Iterator<Item = DeviceFeature> + '_ {
        self.enabled.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.enabled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enabled.is_empty()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done(bool),
}

/// Resolve requests against what the device supports
///
/// Dependencies that are not themselves requested are enabled when supported.
/// A dependency cycle resolves as unsupported.
pub fn resolve_features(
    requests: &[FeatureRequest],
    is_supported: impl Fn(DeviceFeature) -> bool,
) -> Result<FeatureSet> {
    let by_feature: FxHashMap<DeviceFeature, &FeatureRequest> =
        requests.iter().map(|r| (r.feature, r)).collect();
    let mut visits: FxHashMap<DeviceFeature, Visit> = FxHashMap::default();

    fn visit(
        feature: DeviceFeature,
        by_feature: &FxHashMap<DeviceFeature, &FeatureRequest>,
        visits: &mut FxHashMap<DeviceFeature, Visit>,
        is_supported: &dyn Fn(DeviceFeature) -> bool,
    ) -> bool {
        match visits.get(&feature) {
            Some(Visit::Done(enabled)) => return *enabled,
            Some(Visit::InProgress) => return false,
            None => {}
        }
        visits.insert(feature, Visit::InProgress);

        let mut enabled = is_supported(feature);
        if let Some(request) = by_feature.get(&feature) {
            for dependency in &request.dependencies {
                if !visit(*dependency, by_feature, visits, is_supported) {
                    enabled = false;
                }
            }
        }

        visits.insert(feature, Visit::Done(enabled));
        enabled
    }

    let mut enabled = BTreeSet::new();
    for request in requests {
        if visit(request.feature, &by_feature, &mut visits, &is_supported) {
            enabled.insert(request.feature);
            for dependency in &request.dependencies {
                enabled.insert(*dependency);
            }
            continue;
        }

        let name = request.feature.extension_name();
        match request.requirement {
            Requirement::Required => {
                engine_error!("galaxy3d::gpu::Features", "Required extension {} is not supported", name);
                return Err(Error::CapabilityUnsupported(name.to_string()));
            }
            Requirement::Optional => {
                engine_warn!("galaxy3d::gpu::Features", "Extension {} is not supported, disabled", name);
            }
            Requirement::OnlyIfSupported => {
                engine_debug!("galaxy3d::gpu::Features", "Extension {} not present", name);
            }
        }
    }

    engine_info!("galaxy3d::gpu::Features", "{} device features enabled", enabled.len());
    Ok(FeatureSet { enabled })
}

#[cfg(test)]
#[path = "features_tests.rs"]
mod tests;
