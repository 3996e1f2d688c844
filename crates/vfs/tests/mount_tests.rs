//! Integration tests for mount, unmount and the filesystem registry.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use common::{CountingSuper, TestVfs, TrackedFs};
use los_vfs::ramfs::{self, NodeAttr, Ramfs};
use los_vfs::config::MAX_MOUNT_DEPTH;
use los_vfs::{MountFlags, VfsError};

#[test]
fn test_privilege_is_checked_first() {
    let mut t = TestVfs::new();
    let user = t.user_ctx();

    // Every other argument is bad too; privilege still wins
    assert_eq!(
        t.vfs.mount(&user, "none", "", "nosuchfs", MountFlags::empty(), None),
        Err(VfsError::PermissionDenied)
    );
    assert_eq!(t.vfs.unmount(&user, ""), Err(VfsError::PermissionDenied));
    assert_eq!(t.vfs.mounts().len(), 1);
}

#[test]
fn test_mount_argument_errors() {
    let mut t = TestVfs::new();
    let ctx = t.root_ctx();
    let before = t.counts();

    assert_eq!(
        t.vfs.mount(&ctx, "none", "", "ramfs", MountFlags::empty(), None),
        Err(VfsError::BadAddress)
    );
    assert_eq!(
        t.vfs.mount(&ctx, "none", "/mnt", "ext9", MountFlags::empty(), None),
        Err(VfsError::InvalidArgument)
    );
    assert_eq!(
        t.vfs.mount(&ctx, "none", "/etc/passwd", "ramfs", MountFlags::empty(), None),
        Err(VfsError::NotADirectory)
    );
    assert_eq!(
        t.vfs.mount(&ctx, "none", "/nowhere", "ramfs", MountFlags::empty(), None),
        Err(VfsError::NotFound)
    );
    // read_super declines: the covered directory is not left pinned
    assert_eq!(
        t.vfs.mount(&ctx, "/dev/sda", "/mnt", "refusing", MountFlags::empty(), None),
        Err(VfsError::InvalidArgument)
    );
    assert_eq!(
        t.vfs.mount(&ctx, "none", "/mnt", "ramfs", MountFlags::empty(), Some("size=1M")),
        Err(VfsError::InvalidArgument)
    );

    assert_eq!(t.counts(), before);
    assert_eq!(t.vfs.mounts().len(), 1);
}

#[test]
fn test_mount_links_and_pins() {
    let mut t = TestVfs::new();
    let mnt_root = t.mount_ramfs("/mnt");

    let covered = t.vfs.vnodes().get(t.mnt).unwrap();
    assert!(covered.is_mountpoint());
    assert_eq!(covered.mounted(), Some(mnt_root));
    assert_eq!(covered.refcount(), 1);

    let root = t.vfs.vnodes().get(mnt_root).unwrap();
    assert!(root.is_mount_root());
    assert_eq!(root.covers(), Some(t.mnt));
    assert_eq!(root.refcount(), 1);
}

#[test]
fn test_unmount_restores_covered_directory() {
    let mut t = TestVfs::new();
    let ctx = t.root_ctx();
    let before = t.counts();
    let live = t.vfs.live_vnodes();

    let mnt_root = t.mount_ramfs("/mnt");
    let store = t.vfs.vnodes_mut();
    let docs = ramfs::mkdir(store, mnt_root, "docs", NodeAttr::new(0o755)).unwrap();
    ramfs::create(store, docs, "README", NodeAttr::new(0o644)).unwrap();
    assert!(t.lookup(&ctx, "/mnt/docs/README").is_ok());
    assert_eq!(t.vfs.live_vnodes(), live + 3);

    t.vfs.unmount(&ctx, "/mnt").unwrap();

    assert_eq!(t.lookup(&ctx, "/mnt"), Ok(t.mnt));
    assert_eq!(t.lookup(&ctx, "/mnt/docs"), Err(VfsError::NotFound));
    // Evicted vnodes are gone for good
    assert_eq!(t.vfs.refcount(mnt_root), None);
    assert_eq!(t.vfs.refcount(docs), None);
    assert_eq!(t.vfs.live_vnodes(), live);
    assert_eq!(t.counts(), before);
    assert!(!t.vfs.vnodes().get(t.mnt).unwrap().is_mountpoint());
}

#[test]
fn test_unmount_non_mount_point() {
    let mut t = TestVfs::new();
    let ctx = t.root_ctx();

    assert_eq!(t.vfs.unmount(&ctx, "/usr"), Err(VfsError::InvalidArgument));
    assert_eq!(t.vfs.unmount(&ctx, "/missing"), Err(VfsError::NotFound));
    // The root filesystem covers nothing
    assert_eq!(t.vfs.unmount(&ctx, "/"), Err(VfsError::InvalidArgument));
    assert_eq!(t.vfs.unmount(&ctx, ""), Err(VfsError::BadAddress));
}

#[test]
fn test_unmount_busy_while_referenced() {
    let mut t = TestVfs::new();
    let ctx = t.root_ctx();
    let mnt_root = t.mount_ramfs("/mnt");
    ramfs::create(t.vfs.vnodes_mut(), mnt_root, "data", NodeAttr::new(0o644)).unwrap();

    let held = t.vfs.resolve(&ctx, "/mnt/data").unwrap();
    assert_eq!(t.vfs.unmount(&ctx, "/mnt"), Err(VfsError::Busy));
    // Nothing changed
    assert_eq!(t.lookup(&ctx, "/mnt/data"), Ok(held.id()));
    assert_eq!(t.vfs.mounts().len(), 2);
    t.vfs.release(held);

    // An extra reference on the root is busy as well
    let cwd = t.vfs.resolve(&ctx, "/mnt").unwrap();
    assert_eq!(t.vfs.unmount(&ctx, "/mnt"), Err(VfsError::Busy));
    t.vfs.release(cwd);

    assert_eq!(t.vfs.unmount(&ctx, "/mnt"), Ok(()));
    assert_eq!(t.vfs.mounts().len(), 1);
}

#[test]
fn test_nested_mount_keeps_outer_busy() {
    let mut t = TestVfs::new();
    let ctx = t.root_ctx();
    let outer = t.mount_ramfs("/mnt");
    ramfs::mkdir(t.vfs.vnodes_mut(), outer, "inner", NodeAttr::new(0o755)).unwrap();
    let inner = t.mount_ramfs("/mnt/inner");

    assert_eq!(t.lookup(&ctx, "/mnt/inner/.."), Ok(outer));
    assert_eq!(t.lookup(&ctx, "/mnt/inner/../.."), Ok(t.root));

    assert_eq!(t.vfs.unmount(&ctx, "/mnt"), Err(VfsError::Busy));
    t.vfs.unmount(&ctx, "/mnt/inner").unwrap();
    assert_eq!(t.vfs.refcount(inner), None);
    t.vfs.unmount(&ctx, "/mnt").unwrap();
    assert_eq!(t.lookup(&ctx, "/mnt"), Ok(t.mnt));
}

#[test]
fn test_stacked_mounts_unmount_top_first() {
    let mut t = TestVfs::new();
    let ctx = t.root_ctx();
    let first = t.mount_ramfs("/mnt");
    let second = t.mount_ramfs("/mnt");
    assert_ne!(first, second);

    assert_eq!(t.lookup(&ctx, "/mnt/.."), Ok(t.root));
    t.vfs.unmount(&ctx, "/mnt").unwrap();
    assert_eq!(t.lookup(&ctx, "/mnt"), Ok(first));
    t.vfs.unmount(&ctx, "/mnt").unwrap();
    assert_eq!(t.lookup(&ctx, "/mnt"), Ok(t.mnt));
}

#[test]
fn test_over_deep_stack_can_be_peeled() {
    let mut t = TestVfs::new();
    let ctx = t.root_ctx();
    let live = t.vfs.live_vnodes();
    for _ in 0..=MAX_MOUNT_DEPTH {
        t.vfs
            .mount(&ctx, "none", "/mnt", "ramfs", MountFlags::empty(), None)
            .unwrap();
    }
    assert_eq!(t.lookup(&ctx, "/mnt"), Err(VfsError::TooManyLinks));
    assert_eq!(t.vfs.mounts().len(), MAX_MOUNT_DEPTH + 2);

    // Unmount reaches the top from below the bound
    t.vfs.unmount(&ctx, "/mnt").unwrap();
    assert_eq!(t.vfs.mounts().len(), MAX_MOUNT_DEPTH + 1);
    let top = t.lookup(&ctx, "/mnt").unwrap();
    assert!(t.vfs.vnodes().get(top).unwrap().is_mount_root());

    // Trailing separators name the same mount point
    t.vfs.unmount(&ctx, "/mnt//").unwrap();
    while t.vfs.mounts().len() > 1 {
        t.vfs.unmount(&ctx, "/mnt").unwrap();
    }
    assert_eq!(t.lookup(&ctx, "/mnt"), Ok(t.mnt));
    assert_eq!(t.vfs.unmount(&ctx, "/mnt"), Err(VfsError::InvalidArgument));
    assert_eq!(t.vfs.live_vnodes(), live);
}

#[test]
fn test_put_super_runs_once_per_unmount() {
    let mut t = TestVfs::new();
    let ctx = t.root_ctx();
    let sup = Arc::new(CountingSuper::default());
    t.vfs
        .register_filesystem(Arc::new(TrackedFs {
            sup: Arc::clone(&sup),
        }))
        .unwrap();

    let sb = t
        .vfs
        .mount(&ctx, "none", "/srv", "tracked", MountFlags::NOEXEC, None)
        .unwrap();
    assert_eq!(t.vfs.superblock(sb).map(|s| s.fs_type()), Some("tracked"));
    assert_eq!(t.vfs.unregister_filesystem("tracked"), Err(VfsError::Busy));
    assert_eq!(sup.released.load(Ordering::SeqCst), 0);

    t.vfs.unmount(&ctx, "/srv").unwrap();
    assert_eq!(sup.released.load(Ordering::SeqCst), 1);
    assert!(t.vfs.superblock(sb).is_none());
    assert_eq!(t.vfs.unmount_superblock(sb), Err(VfsError::InvalidArgument));
    assert_eq!(t.vfs.unregister_filesystem("tracked"), Ok(()));
}

#[test]
fn test_registry_and_root_mount() {
    let mut t = TestVfs::new();
    assert_eq!(
        t.vfs.register_filesystem(Arc::new(Ramfs)),
        Err(VfsError::Busy)
    );
    assert_eq!(
        t.vfs.mount_root("rootfs", "ramfs", MountFlags::empty(), None),
        Err(VfsError::Busy)
    );
    assert_eq!(t.vfs.root(), Some(t.root));
    assert_eq!(
        t.vfs.filesystems().names(),
        ["failing", "opaque", "ramfs", "refusing"]
    );

    // The root superblock is pinned by both the mount and the default root
    assert_eq!(t.vfs.refcount(t.root), Some(2));
    let root_sb = t.vfs.vnodes().get(t.root).unwrap().superblock().unwrap();
    assert_eq!(t.vfs.unmount_superblock(root_sb), Err(VfsError::Busy));
}

#[test]
fn test_proc_mounts_listing() {
    let mut t = TestVfs::new();
    let ctx = t.root_ctx();
    t.vfs
        .mount(
            &ctx,
            "tmpfs",
            "/srv",
            "ramfs",
            MountFlags::NOSUID | MountFlags::NODEV,
            Some("mode=0777"),
        )
        .unwrap();
    t.vfs
        .mount(&ctx, "/dev/sda1", "/mnt", "ramfs", MountFlags::RDONLY, None)
        .unwrap();

    assert_eq!(
        t.vfs.proc_mounts(),
        "rootfs / ramfs rw 0 0\n\
         tmpfs /srv ramfs rw,nosuid,nodev 0 0\n\
         /dev/sda1 /mnt ramfs ro 0 0\n"
    );
    let srv_root = t.lookup(&ctx, "/srv").unwrap();
    assert_eq!(t.vfs.vnodes().get(srv_root).unwrap().permissions(), 0o777);
}
