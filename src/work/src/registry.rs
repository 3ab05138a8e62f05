// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The work-unit registry.

use std::collections::BTreeMap;

use lux_wire::{Envelope, ReadStream, WireError};

use crate::units::{Work, WorkDecode};

/// The stable command tags.
///
/// These values are the binary format: they follow the registration order of
/// the original catalogue and must never be reassigned. Master and workers
/// must agree on this table exactly; an unrecognized tag is fatal at decode.
pub mod tags {
    /// Tag for [`NewRenderer`](crate::NewRenderer).
    pub const NEW_RENDERER: u32 = 0;
    /// Tag for [`NewModel`](crate::NewModel).
    pub const NEW_MODEL: u32 = 1;
    /// Tag for [`NewGeometry`](crate::NewGeometry).
    pub const NEW_GEOMETRY: u32 = 2;
    /// Tag for [`NewCamera`](crate::NewCamera).
    pub const NEW_CAMERA: u32 = 3;
    /// Tag for [`NewVolume`](crate::NewVolume).
    pub const NEW_VOLUME: u32 = 4;
    /// Tag for [`NewTransferFunction`](crate::NewTransferFunction).
    pub const NEW_TRANSFER_FUNCTION: u32 = 5;
    /// Tag for [`NewPixelOp`](crate::NewPixelOp).
    pub const NEW_PIXEL_OP: u32 = 6;
    /// Tag for [`NewMaterial`](crate::NewMaterial).
    pub const NEW_MATERIAL: u32 = 7;
    /// Tag for [`NewLight`](crate::NewLight).
    pub const NEW_LIGHT: u32 = 8;
    /// Tag for [`NewData`](crate::NewData).
    pub const NEW_DATA: u32 = 9;
    /// Tag for [`NewTexture2d`](crate::NewTexture2d).
    pub const NEW_TEXTURE2D: u32 = 10;
    /// Tag for [`CommitObject`](crate::CommitObject).
    pub const COMMIT_OBJECT: u32 = 11;
    /// Tag for [`CommandRelease`](crate::CommandRelease).
    pub const COMMAND_RELEASE: u32 = 12;
    /// Tag for [`LoadModule`](crate::LoadModule).
    pub const LOAD_MODULE: u32 = 13;
    /// Tag for [`AddGeometry`](crate::AddGeometry).
    pub const ADD_GEOMETRY: u32 = 14;
    /// Tag for [`AddVolume`](crate::AddVolume).
    pub const ADD_VOLUME: u32 = 15;
    /// Tag for [`RemoveGeometry`](crate::RemoveGeometry).
    pub const REMOVE_GEOMETRY: u32 = 16;
    /// Tag for [`RemoveVolume`](crate::RemoveVolume).
    pub const REMOVE_VOLUME: u32 = 17;
    /// Tag for [`CreateFrameBuffer`](crate::CreateFrameBuffer).
    pub const CREATE_FRAMEBUFFER: u32 = 18;
    /// Tag for [`ClearFrameBuffer`](crate::ClearFrameBuffer).
    pub const CLEAR_FRAMEBUFFER: u32 = 19;
    /// Tag for [`RenderFrame`](crate::RenderFrame).
    pub const RENDER_FRAME: u32 = 20;
    /// Tag for [`SetRegion`](crate::SetRegion).
    pub const SET_REGION: u32 = 21;
    /// Tag for [`SetPixelOp`](crate::SetPixelOp).
    pub const SET_PIXEL_OP: u32 = 22;
    /// Tag for [`SetMaterial`](crate::SetMaterial).
    pub const SET_MATERIAL: u32 = 23;
    /// Tag for [`SetParam`](crate::SetParam).
    pub const SET_PARAM: u32 = 24;
    /// Tag for [`RemoveParam`](crate::RemoveParam).
    pub const REMOVE_PARAM: u32 = 25;
    /// Tag for [`CommandFinalize`](crate::CommandFinalize).
    pub const COMMAND_FINALIZE: u32 = 26;
}

type DecodeFn = fn(&mut ReadStream) -> Result<Box<dyn Work>, WireError>;

/// Maps command tags to decode functions.
#[derive(Debug, Default)]
pub struct WorkRegistry {
    decoders: BTreeMap<u32, DecodeFn>,
}

impl WorkRegistry {
    /// Creates an empty registry.
    pub fn new() -> WorkRegistry {
        WorkRegistry::default()
    }

    /// Registers a unit type under its stable tag.
    ///
    /// Panics if the tag is already taken: a tag collision means the
    /// hand-maintained table above has diverged, which is a build defect,
    /// not a runtime condition.
    pub fn register<W: WorkDecode + 'static>(&mut self) {
        fn decode_boxed<W: WorkDecode + 'static>(
            r: &mut ReadStream,
        ) -> Result<Box<dyn Work>, WireError> {
            Ok(Box::new(W::decode(r)?))
        }
        let previous = self.decoders.insert(W::TAG, decode_boxed::<W>);
        assert!(previous.is_none(), "command tag {} registered twice", W::TAG);
    }

    /// Materializes the unit carried by an envelope.
    pub fn decode(&self, env: &Envelope) -> Result<Box<dyn Work>, WireError> {
        let decode = self
            .decoders
            .get(&env.tag)
            .ok_or(WireError::UnknownTag { tag: env.tag })?;
        let mut r = ReadStream::new(env.payload.clone());
        decode(&mut r)
    }

    /// The number of registered unit types.
    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    /// Reports whether no unit types are registered.
    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}

/// Builds the registry holding the full command catalogue.
pub fn core_registry() -> WorkRegistry {
    use crate::units::*;

    let mut registry = WorkRegistry::new();
    registry.register::<NewRenderer>();
    registry.register::<NewModel>();
    registry.register::<NewGeometry>();
    registry.register::<NewCamera>();
    registry.register::<NewVolume>();
    registry.register::<NewTransferFunction>();
    registry.register::<NewPixelOp>();

    registry.register::<NewMaterial>();
    registry.register::<NewLight>();

    registry.register::<NewData>();
    registry.register::<NewTexture2d>();

    registry.register::<CommitObject>();
    registry.register::<CommandRelease>();

    registry.register::<LoadModule>();

    registry.register::<AddGeometry>();
    registry.register::<AddVolume>();
    registry.register::<RemoveGeometry>();
    registry.register::<RemoveVolume>();

    registry.register::<CreateFrameBuffer>();
    registry.register::<ClearFrameBuffer>();
    registry.register::<RenderFrame>();

    registry.register::<SetRegion>();
    registry.register::<SetPixelOp>();

    registry.register::<SetMaterial>();
    registry.register::<SetParam>();
    registry.register::<RemoveParam>();

    registry.register::<CommandFinalize>();
    registry
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    #[test]
    fn test_unknown_tag_is_fatal() {
        let registry = core_registry();
        let env = Envelope {
            tag: 9999,
            payload: Bytes::new(),
        };
        assert_eq!(
            registry.decode(&env).unwrap_err(),
            WireError::UnknownTag { tag: 9999 }
        );
    }

    #[test]
    fn test_catalogue_is_complete() {
        assert_eq!(core_registry().len(), 27);
    }
}
