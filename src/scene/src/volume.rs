// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Volumes and region updates.

use lux_ore::cast::CastFrom;
use lux_repr::{ElementKind, Vec3i};

use crate::error::SceneError;
use crate::params::ParamMap;

/// Kind-specific state for a volume.
///
/// The voxel extent comes from the `dimensions` parameter at commit; voxel
/// contents arrive incrementally through region updates. The element kind is
/// fixed by the first region update and later updates must agree.
#[derive(Debug, Default)]
pub struct VolumeState {
    dims: Option<Vec3i>,
    element: Option<ElementKind>,
    voxels: Vec<u8>,
}

impl VolumeState {
    /// Reads the volume's parameters at commit.
    ///
    /// Changing the dimensions discards previously written voxels.
    pub fn commit(&mut self, params: &ParamMap) -> Result<(), SceneError> {
        if let Some(dims) = params.get_vec3i("dimensions") {
            if dims.x <= 0 || dims.y <= 0 || dims.z <= 0 {
                return Err(SceneError::InvalidExtent(dims));
            }
            if self.dims != Some(dims) {
                self.dims = Some(dims);
                self.element = None;
                self.voxels.clear();
            }
        }
        Ok(())
    }

    /// Copies a sub-volume update into the voxel array.
    ///
    /// Requires committed dimensions; the region must lie entirely inside
    /// them and `data` must hold exactly `extent` elements of `kind`.
    pub fn set_region(
        &mut self,
        data: &[u8],
        start: Vec3i,
        extent: Vec3i,
        kind: ElementKind,
    ) -> Result<(), SceneError> {
        let dims = self.dims.ok_or(SceneError::VolumeNotCommitted)?;
        if extent.x <= 0 || extent.y <= 0 || extent.z <= 0 {
            return Err(SceneError::InvalidExtent(extent));
        }
        let in_bounds = start.x >= 0
            && start.y >= 0
            && start.z >= 0
            && i64::from(start.x) + i64::from(extent.x) <= i64::from(dims.x)
            && i64::from(start.y) + i64::from(extent.y) <= i64::from(dims.y)
            && i64::from(start.z) + i64::from(extent.z) <= i64::from(dims.z);
        if !in_bounds {
            return Err(SceneError::RegionOutOfBounds {
                start,
                extent,
                dims,
            });
        }
        let elem_size = kind.size_of().ok_or(SceneError::StringDataDisallowed)?;
        let expected = usize::cast_from(u64::try_from(extent.volume()).expect("positive volume"))
            * elem_size;
        if data.len() != expected {
            return Err(SceneError::DataSizeMismatch {
                expected,
                got: data.len(),
            });
        }
        match self.element {
            None => {
                self.element = Some(kind);
                let total =
                    usize::cast_from(u64::try_from(dims.volume()).expect("positive volume"))
                        * elem_size;
                self.voxels = vec![0; total];
            }
            Some(element) if element != kind => {
                return Err(SceneError::ElementKindMismatch {
                    expected: element,
                    got: kind,
                });
            }
            Some(_) => {}
        }

        // Copy row by row; x varies fastest in both buffers.
        let row = extent.x as usize * elem_size;
        for z in 0..extent.z {
            for y in 0..extent.y {
                let src_row = (z as usize * extent.y as usize + y as usize) * row;
                let dst_elem = ((start.z + z) as usize * dims.y as usize
                    + (start.y + y) as usize)
                    * dims.x as usize
                    + start.x as usize;
                let dst_row = dst_elem * elem_size;
                self.voxels[dst_row..dst_row + row].copy_from_slice(&data[src_row..src_row + row]);
            }
        }
        Ok(())
    }

    /// The committed dimensions, if any.
    pub fn dims(&self) -> Option<Vec3i> {
        self.dims
    }

    /// The element kind, fixed by the first region update.
    pub fn element(&self) -> Option<ElementKind> {
        self.element
    }

    /// The voxel array.
    pub fn voxels(&self) -> &[u8] {
        &self.voxels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::StoredParam;

    fn committed(dims: Vec3i) -> VolumeState {
        let mut params = ParamMap::new();
        params.set("dimensions", StoredParam::Vec3i(dims));
        let mut volume = VolumeState::default();
        volume.commit(&params).unwrap();
        volume
    }

    #[test]
    fn test_region_is_copied_in_place() {
        let mut volume = committed(Vec3i::new(4, 4, 1));
        let data: Vec<u8> = (1..=16).collect();
        volume
            .set_region(&data, Vec3i::new(1, 1, 0), Vec3i::new(2, 2, 1), ElementKind::Int32)
            .unwrap();
        assert_eq!(volume.element(), Some(ElementKind::Int32));
        // Row y=1 holds elements 1..=8 at x=1..3.
        let voxels = volume.voxels();
        assert_eq!(&voxels[(4 + 1) * 4..(4 + 3) * 4], &data[..8]);
        // Untouched voxels stay zero.
        assert!(voxels[..4].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_region_requires_committed_dimensions() {
        let mut volume = VolumeState::default();
        assert_eq!(
            volume
                .set_region(&[0; 4], Vec3i::new(0, 0, 0), Vec3i::new(1, 1, 1), ElementKind::Int32)
                .unwrap_err(),
            SceneError::VolumeNotCommitted
        );
    }

    #[test]
    fn test_region_must_stay_in_bounds() {
        let mut volume = committed(Vec3i::new(2, 2, 2));
        let err = volume
            .set_region(&[0; 8], Vec3i::new(1, 0, 0), Vec3i::new(2, 1, 1), ElementKind::Int32)
            .unwrap_err();
        assert!(matches!(err, SceneError::RegionOutOfBounds { .. }));
    }

    #[test]
    fn test_element_kind_is_sticky() {
        let mut volume = committed(Vec3i::new(2, 1, 1));
        volume
            .set_region(&[0; 8], Vec3i::new(0, 0, 0), Vec3i::new(2, 1, 1), ElementKind::Int32)
            .unwrap();
        let err = volume
            .set_region(&[0; 8], Vec3i::new(0, 0, 0), Vec3i::new(2, 1, 1), ElementKind::Float32)
            .unwrap_err();
        assert_eq!(
            err,
            SceneError::ElementKindMismatch {
                expected: ElementKind::Int32,
                got: ElementKind::Float32,
            }
        );
    }
}
