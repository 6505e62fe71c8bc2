//! Singularity Collapse headless driver
//!
//! Runs one full collapse cycle on the sandbox world and logs what happens.
//! Pass a directory to keep the saves on disk, and optionally a broadcast
//! mode: `singularity-collapse ./saves immediate`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Singularity Collapse (headless) starting...");

    let mut args = std::env::args().skip(1);
    let dir = args.next();
    let mode = match args.next() {
        Some(name) => match singularity_collapse::BroadcastMode::from_str(&name) {
            Some(mode) => mode,
            None => {
                log::error!("Unknown broadcast mode '{name}' (immediate, delayed, summary)");
                std::process::exit(2);
            }
        },
        None => singularity_collapse::BroadcastMode::Summary,
    };

    let result = match dir {
        Some(dir) => singularity_collapse::persistence::FileStore::new(dir)
            .and_then(|mut store| demo::run(&mut store, mode)),
        None => demo::run(&mut singularity_collapse::persistence::MemoryStore::new(), mode),
    };
    if let Err(err) = result {
        log::error!("Collapse run failed: {err}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Library-only on wasm; there is no headless host to drive
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use glam::{IVec3, Vec3};

    use singularity_collapse::collapse::{CollapseEffect, PhaseKind};
    use singularity_collapse::consts::TICKS_PER_SECOND;
    use singularity_collapse::field::FieldEvent;
    use singularity_collapse::growth::{
        BoolField, DoubleField, GrowthBlockDefinition, GrowthMutation, Identifier,
    };
    use singularity_collapse::persistence::SaveStore;
    use singularity_collapse::sim::sandbox::{SandboxActor, SandboxWorld};
    use singularity_collapse::sim::{ActorWorld, Simulation};
    use singularity_collapse::{BroadcastMode, DimensionProfile, ProfileRegistry, Result};

    const MAX_TICKS: u64 = 20_000;

    pub fn run<S: SaveStore>(store: &mut S, broadcast_mode: BroadcastMode) -> Result<()> {
        let profile = DimensionProfile {
            fuse_delay_ticks: 200,
            fuse_collapse_ticks: 150,
            core_charge_ticks: 60,
            reset_delay_ticks: 100,
            broadcast_mode,
            ..Default::default()
        };
        profile.validate()?;
        log::info!("Broadcast mode: {}", broadcast_mode.as_str());

        let mut sim = Simulation::new(ProfileRegistry::new(profile), 0x5eed);
        let mut world = SandboxWorld::new("minecraft:overworld");
        let center = IVec3::new(0, 64, 0);
        for i in 0..12 {
            let angle = i as f32 / 12.0 * std::f32::consts::TAU;
            let r = 6.0 + i as f32 * 3.0;
            world.add_actor(SandboxActor::at(Vec3::new(
                r * angle.cos(),
                65.0,
                r * angle.sin(),
            )));
        }
        world.viewers = vec![Vec3::new(0.0, 70.0, 0.0)];
        world.infection_health = 0.0;
        world.final_wave_tick = Some(150);

        sim.register_world(world.key().clone());
        sim.load_world(world.key(), &*store)?;
        sim.load_scheduler(&*store)?;
        sim.begin_infection(world.key(), center);

        // A growth block near the core, retuned shortly before it lights
        let growth_pos = IVec3::new(12, 64, 0);
        let mut growth = GrowthBlockDefinition::new(Identifier::parse("collapse:void_growth")?);
        growth.has_fuse = true;
        let retune = GrowthMutation::new()
            .set_bool(BoolField::Pulling, true)
            .set_double(DoubleField::ForceRadius, 10.0)?;
        sim.schedule_mutation(world.key().clone(), growth_pos, retune, world.game_time(), 20);

        let mut finished = false;
        let mut saves = 0;
        while world.game_time() < MAX_TICKS {
            world.advance();
            let now = world.game_time();
            if now == 40 {
                sim.spawn_growth_force(&mut world, growth_pos, &growth)?;
                sim.ignite_growth_fuse(&mut world, growth_pos, &growth)?;
            }

            let report = sim.on_world_tick(&mut world);
            world.integrate();
            saves += sim.save_dirty(store)?;

            for event in &report.field_events {
                match event {
                    FieldEvent::Notification { notification, .. } => {
                        log::warn!("[{:?}] {}", notification.severity, notification.message)
                    }
                    FieldEvent::Expired { id, release_burst } => {
                        log::info!("{} expired (burst: {})", id, release_burst)
                    }
                    FieldEvent::PhaseChanged { .. } => {}
                }
            }
            if let Some((from, to)) = report.transition {
                log::info!(
                    "t={:.1}s {} -> {}",
                    now as f32 / TICKS_PER_SECOND as f32,
                    from,
                    to
                );
                if from != PhaseKind::Dormant && to == PhaseKind::Dormant {
                    finished = true;
                    break;
                }
            }
        }

        let carved = world.count_effects(|e| matches!(e, CollapseEffect::CarveColumn { .. }));
        log::info!(
            "Finished: {} after {} ticks, {} columns carved, {} chunks sent, {} saves",
            if finished { "cycle complete" } else { "tick limit hit" },
            world.game_time(),
            carved,
            world.sent_chunks.len(),
            saves
        );
        let farthest = world
            .actors()
            .iter()
            .map(|a| a.position.distance(Vec3::new(0.5, 64.5, 0.5)))
            .fold(0.0_f32, f32::max);
        log::info!("Farthest actor ended {:.1} blocks from the core", farthest);
        Ok(())
    }
}
