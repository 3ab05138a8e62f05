// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! End-to-end tests over an in-process cluster.
//!
//! Each test wires a master and a set of worker threads through the
//! switchboard, drives the master façade, and asserts on the workers'
//! replicas after their serve loops return. Worker-side panics propagate
//! through `join`.

use std::rc::Rc;
use std::sync::Arc;
use std::thread;

use bytes::Bytes;
use lux_comm::{RankGroups, Switchboard, SwitchboardConfig};
use lux_repr::{
    ChannelMask, DataFlags, ElementKind, FrameBufferFormat, ObjectHandle, ObjectKind, ParamValue,
    Vec3i,
};
use lux_scene::{FactoryTable, Payload, SceneError, StaticLoader};
use lux_work::{DeviceConfig, MasterDevice, Worker, WorkError};

fn bootstrap(workers: usize) -> (MasterDevice, Vec<RankGroups>) {
    let (master_groups, worker_groups) =
        Switchboard::bootstrap(SwitchboardConfig { workers });
    let master = MasterDevice::new(
        master_groups,
        DeviceConfig {
            loader: Box::new(StaticLoader::new()),
            ..DeviceConfig::default()
        },
    )
    .unwrap();
    (master, worker_groups)
}

fn spawn_workers<F>(groups: Vec<RankGroups>, check: F) -> Vec<thread::JoinHandle<()>>
where
    F: Fn(&Worker) + Send + Sync + 'static,
{
    let check = Arc::new(check);
    groups
        .into_iter()
        .map(|groups| {
            let check = Arc::clone(&check);
            thread::spawn(move || {
                let mut worker = Worker::with_loader(groups, Box::new(StaticLoader::new()));
                worker.run().unwrap();
                check(&worker);
            })
        })
        .collect()
}

fn join(handles: Vec<thread::JoinHandle<()>>) {
    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_trivial_frame() {
    let (mut master, worker_groups) = bootstrap(2);

    let handles = spawn_workers(worker_groups, move |worker| {
        // Scenario 3: the negative sample count was clamped at commit.
        let renderer = worker.scene().objects.lookup(ObjectHandle(1)).unwrap();
        match &renderer.core().payload {
            Payload::Renderer(state) => assert_eq!(state.derived().pixel_samples, 1),
            payload => panic!("unexpected payload: {payload:?}"),
        }
        let fb = worker.scene().objects.lookup(ObjectHandle(2)).unwrap();
        assert_eq!(fb.kind(), ObjectKind::FrameBuffer);
    });

    let renderer = master.new_renderer("scivis").unwrap();
    let fb = master
        .create_framebuffer(
            lux_repr::Vec2i::new(4, 4),
            FrameBufferFormat::Rgba8,
            ChannelMask::COLOR,
        )
        .unwrap();
    master.clear_framebuffer(fb, ChannelMask::COLOR).unwrap();
    master
        .set_param(renderer, "pixelSamples", ParamValue::Int(-3))
        .unwrap();
    master.commit(renderer).unwrap();

    let variance = master.render_frame(fb, renderer, ChannelMask::COLOR).unwrap();
    assert!(variance >= 0.0);

    master.finalize().unwrap();
    join(handles);
}

#[test]
fn test_handle_translation_in_object_data() {
    let (mut master, worker_groups) = bootstrap(2);

    let handles = spawn_workers(worker_groups, move |worker| {
        let geometry = worker.scene().objects.lookup(ObjectHandle(1)).unwrap();
        // One reference from the registry, one from the data array.
        assert_eq!(Rc::strong_count(geometry), 2);

        let data = worker.scene().objects.lookup(ObjectHandle(2)).unwrap();
        match &data.core().payload {
            Payload::Data(array) => {
                let elements = array.objects().unwrap();
                assert_eq!(elements.len(), 1);
                assert!(Rc::ptr_eq(elements[0].as_ref().unwrap(), geometry));
            }
            payload => panic!("unexpected payload: {payload:?}"),
        }
    });

    let geometry = master.new_geometry("spheres").unwrap();
    let payload = Bytes::from(geometry.0.to_le_bytes().to_vec());
    master
        .new_data(
            1,
            ElementKind::Object(ObjectKind::Geometry),
            payload,
            DataFlags::empty(),
        )
        .unwrap();

    master.finalize().unwrap();
    join(handles);
}

#[test]
fn test_master_worker_parameter_asymmetry() {
    let (mut master, worker_groups) = bootstrap(2);

    let handles = spawn_workers(worker_groups, move |worker| {
        let camera = worker.scene().objects.lookup(ObjectHandle(1)).unwrap();
        assert_eq!(camera.core().params.get_f32("fovy"), Some(45.0));
        assert!(camera.is_committed());
    });

    let camera = master.new_camera("perspective").unwrap();
    master
        .set_param(camera, "fovy", ParamValue::Float(45.0))
        .unwrap();
    master.commit(camera).unwrap();

    // The master holds a mirror object, but cameras are outside the mirror
    // set for parameters, so nothing was stored.
    let mirror = master.scene().objects.lookup(camera).unwrap();
    assert!(mirror.core().params.is_empty());

    master.finalize().unwrap();
    join(handles);
}

#[test]
fn test_commands_apply_in_broadcast_order() {
    let (mut master, worker_groups) = bootstrap(3);

    let handles = spawn_workers(worker_groups, move |worker| {
        let camera = worker.scene().objects.lookup(ObjectHandle(1)).unwrap();
        // Only the last write in broadcast order survives.
        assert_eq!(camera.core().params.get_i32("counter"), Some(99));
    });

    let camera = master.new_camera("perspective").unwrap();
    for value in 0..100 {
        master
            .set_param(camera, "counter", ParamValue::Int(value))
            .unwrap();
        if value % 25 == 0 {
            // Interleave barrier-bracketed units to exercise the rendezvous
            // discipline between ordinary commands.
            master.commit(camera).unwrap();
        }
    }

    master.finalize().unwrap();
    join(handles);
}

#[test]
fn test_oversize_region_is_rejected_before_broadcast() {
    let (mut master, worker_groups) = bootstrap(2);

    let handles = spawn_workers(worker_groups, move |worker| {
        let volume = worker.scene().objects.lookup(ObjectHandle(1)).unwrap();
        match &volume.core().payload {
            // No region update ever reached the workers.
            Payload::Volume(state) => assert!(state.voxels().is_empty()),
            payload => panic!("unexpected payload: {payload:?}"),
        }
    });

    let volume = master.new_volume("structured_regular").unwrap();
    master
        .set_param(volume, "dimensions", ParamValue::Vec3i(Vec3i::new(1024, 1024, 768)))
        .unwrap();
    master.commit(volume).unwrap();

    // A ~3 GiB update: rejected at the master, workers untouched.
    let err = master
        .set_region(
            volume,
            Vec3i::new(0, 0, 0),
            Vec3i::new(1024, 1024, 768),
            ElementKind::Float32,
            Bytes::new(),
        )
        .unwrap_err();
    assert!(matches!(err, WorkError::RegionTooLarge { .. }));

    master.finalize().unwrap();
    join(handles);
}

#[test]
fn test_release_undefines_handles_everywhere() {
    let (mut master, worker_groups) = bootstrap(2);

    let handles = spawn_workers(worker_groups, move |worker| {
        assert!(!worker.scene().objects.defined(ObjectHandle(1)));
        assert!(worker.scene().objects.defined(ObjectHandle(2)));
    });

    let released = master.new_renderer("scivis").unwrap();
    let kept = master.new_renderer("pathtracer").unwrap();
    master.release(released).unwrap();

    assert!(!master.scene().objects.defined(released));
    assert!(master.scene().objects.defined(kept));

    master.finalize().unwrap();
    join(handles);
}

#[test]
fn test_pixel_op_chains_onto_framebuffer() {
    let (mut master, worker_groups) = bootstrap(2);

    let handles = spawn_workers(worker_groups, move |worker| {
        let fb = worker.scene().objects.lookup(ObjectHandle(1)).unwrap();
        match &fb.core().payload {
            Payload::FrameBuffer(state) => assert!(state.has_pixel_op()),
            payload => panic!("unexpected payload: {payload:?}"),
        }
    });

    let fb = master
        .create_framebuffer(
            lux_repr::Vec2i::new(16, 16),
            FrameBufferFormat::Rgba32F,
            ChannelMask::COLOR | ChannelMask::ACCUM,
        )
        .unwrap();
    let op = master.new_pixel_op("tone_mapper").unwrap();
    master.set_pixel_op(fb, op).unwrap();

    master.finalize().unwrap();
    join(handles);
}

#[test]
fn test_modules_load_on_every_rank() {
    fn init_glow(table: &mut FactoryTable) {
        table.register(ObjectKind::Light, "glow", |_| Payload::Generic);
    }

    fn loader() -> Box<StaticLoader> {
        let mut loader = StaticLoader::new();
        loader.provide("glow", init_glow);
        Box::new(loader)
    }

    let (master_groups, worker_groups) =
        Switchboard::bootstrap(SwitchboardConfig { workers: 2 });
    let mut master = MasterDevice::new(
        master_groups,
        DeviceConfig {
            modules: vec!["glow".into()],
            loader: loader(),
            ..DeviceConfig::default()
        },
    )
    .unwrap();

    let handles = worker_groups
        .into_iter()
        .map(|groups| {
            thread::spawn(move || {
                let mut worker = Worker::with_loader(groups, loader());
                worker.run().unwrap();
                let light = worker.scene().objects.lookup(ObjectHandle(1)).unwrap();
                assert_eq!(light.kind(), ObjectKind::Light);
                assert_eq!(light.type_name(), "glow");
            })
        })
        .collect();

    let light = master.new_light(ObjectHandle::NULL, "glow").unwrap();
    assert!(master.scene().objects.defined(light));

    master.finalize().unwrap();
    join(handles);
}

#[test]
fn test_missing_module_fails_the_master() {
    let (mut master, worker_groups) = bootstrap(1);

    // The master's loader knows nothing; its own load fails after the
    // broadcast, and the worker fails on the same command.
    let err = master.load_module("ghost").unwrap_err();
    assert_eq!(
        err,
        WorkError::Scene(SceneError::ModuleNotFound {
            name: "ghost".into(),
        })
    );

    let handle = worker_groups
        .into_iter()
        .map(|groups| {
            thread::spawn(move || {
                let mut worker = Worker::with_loader(groups, Box::new(StaticLoader::new()));
                assert!(worker.run().is_err());
            })
        })
        .collect();
    join(handle);
}
