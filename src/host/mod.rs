// scenebridge/src/host/mod.rs
//
// Copyright (c) 2025 Scenebridge Team
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE>
// or the MIT license <LICENSE-MIT>, at your option.
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Handoff of scene work to the host application's main context.
//!
//! The scene is owned by [`HostContext`], which runs wherever the host
//! application runs its main loop. Network tasks hold a [`HostHandle`] and
//! submit closures with [`HostHandle::run_on_main`]; the closure runs on the
//! main context and its return value is sent back to the caller.
//!
//! Jobs run one at a time in submission order. A panicking job is contained:
//! the caller gets [`BridgeError::Host`], the main context keeps running.

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};

use tokio::sync::{mpsc, oneshot};

use crate::error::{BridgeError, Result};
use crate::scene::Scene;

type Job = Box<dyn FnOnce(&mut Scene) + Send>;

/// Creates a main context owning `scene` and a handle for submitting work to it.
pub fn channel(scene: Scene) -> (HostContext, HostHandle) {
    let (jobs_tx, jobs_rx) = mpsc::channel(1);
    (
        HostContext {
            scene,
            jobs: jobs_rx,
        },
        HostHandle { jobs: jobs_tx },
    )
}

/// Cloneable sender side of the main-context handoff.
#[derive(Clone)]
pub struct HostHandle {
    jobs: mpsc::Sender<Job>,
}

impl std::fmt::Debug for HostHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostHandle")
            .field("closed", &self.jobs.is_closed())
            .finish()
    }
}

impl HostHandle {
    /// Runs `job` on the main context and waits for its result.
    pub async fn run_on_main<T, F>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut Scene) -> T + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let wrapped: Job = Box::new(move |scene: &mut Scene| {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| job(scene)));
            let _ = reply_tx.send(outcome.map_err(panic_message));
        });

        self.jobs
            .send(wrapped)
            .await
            .map_err(|_| BridgeError::Host("main context is not running".to_string()))?;

        match reply_rx.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(message)) => Err(BridgeError::Host(format!("handler panicked: {}", message))),
            Err(_) => Err(BridgeError::Host("main context dropped the request".to_string())),
        }
    }

    /// Returns `true` once the main context has gone away.
    pub fn is_closed(&self) -> bool {
        self.jobs.is_closed()
    }
}

/// Owner of the scene; executes submitted jobs.
pub struct HostContext {
    scene: Scene,
    jobs: mpsc::Receiver<Job>,
}

impl std::fmt::Debug for HostContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostContext")
            .field("scene", &self.scene.name)
            .field("queued", &self.jobs.len())
            .finish()
    }
}

impl HostContext {
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Runs every job already queued, without waiting. Returns how many ran.
    ///
    /// For hosts that drive the bridge from their own timer or frame tick.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.jobs.try_recv() {
            job(&mut self.scene);
            ran += 1;
        }
        ran
    }

    /// Runs jobs until every [`HostHandle`] is dropped, then returns the scene.
    pub async fn run(mut self) -> Scene {
        while let Some(job) = self.jobs.recv().await {
            job(&mut self.scene);
        }
        self.scene
    }

    /// Runs jobs until `stop` resolves or every handle is dropped.
    pub async fn run_until<S>(mut self, stop: S) -> Scene
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(stop);
        loop {
            tokio::select! {
                job = self.jobs.recv() => match job {
                    Some(job) => job(&mut self.scene),
                    None => break,
                },
                _ = &mut stop => {
                    tracing::debug!("Main context stop requested");
                    break;
                }
            }
        }
        self.scene
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{ObjectData, ORIGIN};

    #[tokio::test]
    async fn test_run_on_main_returns_value() {
        let (host, handle) = channel(Scene::with_default_contents());
        let main = tokio::spawn(host.run());

        let count = handle.run_on_main(|scene| scene.object_count()).await.unwrap();
        assert_eq!(count, 3);

        let name = handle
            .run_on_main(|scene| scene.add_object("Empty", ObjectData::Empty, ORIGIN))
            .await
            .unwrap();
        assert_eq!(name, "Empty");

        drop(handle);
        let scene = main.await.unwrap();
        assert_eq!(scene.object_count(), 4);
    }

    #[tokio::test]
    async fn test_panicking_job_is_contained() {
        let (host, handle) = channel(Scene::new("Test"));
        let main = tokio::spawn(host.run());

        let err = handle
            .run_on_main(|_scene| -> usize { panic!("boom") })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("handler panicked: boom"));

        // Main context survived.
        let count = handle.run_on_main(|scene| scene.object_count()).await.unwrap();
        assert_eq!(count, 0);

        drop(handle);
        main.await.unwrap();
    }

    #[tokio::test]
    async fn test_closed_main_context() {
        let (host, handle) = channel(Scene::new("Test"));
        drop(host);
        assert!(handle.is_closed());
        let err = handle.run_on_main(|scene| scene.object_count()).await.unwrap_err();
        assert!(matches!(err, BridgeError::Host(_)));
    }

    #[tokio::test]
    async fn test_run_pending() {
        let (mut host, handle) = channel(Scene::new("Test"));
        assert_eq!(host.run_pending(), 0);

        let submit = tokio::spawn(async move {
            handle
                .run_on_main(|scene| scene.add_object("Empty", ObjectData::Empty, ORIGIN))
                .await
        });
        // Wait for the job to land in the queue.
        while host.run_pending() == 0 {
            tokio::task::yield_now().await;
        }
        assert_eq!(submit.await.unwrap().unwrap(), "Empty");
        assert!(host.scene().object("Empty").is_some());
    }

    #[tokio::test]
    async fn test_run_until_stop() {
        let (host, _handle) = channel(Scene::new("Test"));
        let scene = host.run_until(async {}).await;
        assert_eq!(scene.name, "Test");
    }
}
