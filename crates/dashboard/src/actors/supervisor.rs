use std::{collections::HashMap, time::Duration};

use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, Instant},
};
use tracing::{error, warn};
use uuid::Uuid;

use common::actors::{Actor, ActorType, ControlMessage};

type ActorFactory = Box<dyn Fn() -> Box<dyn Actor + Send + Sync> + Send + Sync>;

/// Restarts registered actors when their heartbeat goes quiet. Each
/// registered kind has a factory so a replacement can always be built
/// from scratch.
pub struct Supervisor {
    actor_factories: HashMap<ActorType, ActorFactory>,
    pulses: HashMap<ActorType, Instant>,
    handles: HashMap<ActorType, JoinHandle<()>>,
    ids: HashMap<Uuid, ActorType>,
    control_tx: mpsc::Sender<ControlMessage>,
    control_rx: mpsc::Receiver<ControlMessage>,
}

impl Supervisor {
    pub fn new() -> Self {
        let (control_tx, control_rx) = mpsc::channel::<ControlMessage>(512);
        Self {
            actor_factories: HashMap::new(),
            pulses: HashMap::new(),
            handles: HashMap::new(),
            ids: HashMap::new(),
            control_tx,
            control_rx,
        }
    }

    pub fn sender(&self) -> mpsc::Sender<ControlMessage> {
        self.control_tx.clone()
    }

    pub fn register_actor(&mut self, actor_type: ActorType, factory: ActorFactory) {
        self.actor_factories.insert(actor_type, factory);
    }

    pub async fn start(&mut self) {
        let mut check_interval = time::interval(Duration::from_secs(1));
        let timeout_duration = Duration::from_secs(3);

        let actors: Vec<ActorType> = self.actor_factories.keys().copied().collect();
        for actor_type in actors {
            self.spawn_actor(actor_type);
        }

        loop {
            tokio::select! {
                Some(msg) = self.control_rx.recv() => {
                    match msg {
                        ControlMessage::Heartbeat(id) => {
                            if let Some(actor_type) = self.ids.get(&id) {
                                self.pulses.insert(*actor_type, Instant::now());
                            }
                        }
                        ControlMessage::Shutdown(id) => {
                            if let Some(actor_type) = self.ids.remove(&id) {
                                warn!("{:?} is shutting down gracefully.", actor_type);
                                self.pulses.remove(&actor_type);
                                if let Some(handle) = self.handles.remove(&actor_type) {
                                    handle.abort();
                                }
                            }
                        }
                        ControlMessage::Error(id, error_msg) => {
                            let actor_type = self.ids.get(&id).copied();
                            error!("Actor {:?} reported error: {}", actor_type, error_msg);
                            if let Some(actor_type) = actor_type {
                                self.pulses.insert(actor_type, Instant::now());
                            }
                        }
                        ControlMessage::Spawn(actor) => {
                            self.spawn_dynamic(actor);
                        }
                    }
                }

                _ = check_interval.tick() => {
                    let dead_timeout = Instant::now() - timeout_duration;
                    let mut dead_actors = Vec::new();

                    for (&actor_type, &pulse) in self.pulses.iter() {
                        if pulse < dead_timeout {
                            warn!("{:?} is unresponsive!", actor_type);
                            dead_actors.push(actor_type);
                            self.handles[&actor_type].abort();
                        }
                    }

                    for actor_type in dead_actors {
                        self.ids.retain(|_, t| *t != actor_type);
                        self.spawn_actor(actor_type);
                    }
                }
            }
        }
    }

    fn spawn_actor(&mut self, actor_type: ActorType) {
        let mut new_actor = self.actor_factories[&actor_type]();
        self.ids.insert(new_actor.id(), actor_type);
        let tx = self.control_tx.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = new_actor.run(tx).await {
                error!("Actor {:?} crashed: {}", actor_type, e);
            }
        });
        self.handles.insert(actor_type, handle);
        self.pulses.insert(actor_type, Instant::now());
    }

    /// One-shot actors requested at runtime; they run untracked and are
    /// not restarted.
    fn spawn_dynamic(&mut self, mut actor: Box<dyn Actor + Send + Sync>) {
        self.ids.insert(actor.id(), ActorType::Dynamic);
        let tx = self.control_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = actor.run(tx).await {
                error!("Dynamic actor crashed: {}", e);
            }
        });
    }
}
