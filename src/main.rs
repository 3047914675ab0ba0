use std::sync::Arc;
use nalgebra::DMatrix;
use rs_constrained_ik::chain::SerialChain;
use rs_constrained_ik::constraint::ConstraintTier;
use rs_constrained_ik::avoid_joint_limits::AvoidJointLimits;
use rs_constrained_ik::goal_orientation::GoalOrientation;
use rs_constrained_ik::goal_position::GoalPosition;
use rs_constrained_ik::kinematic_traits::{JointLimit, Kinematics};
use rs_constrained_ik::minimize_change::MinimizeChange;
use rs_constrained_ik::parameters::SolverConfig;
use rs_constrained_ik::restart::RandomRestart;
use rs_constrained_ik::solver::IKSolver;
use rs_constrained_ik::step_clamp::StepClamp;
use rs_constrained_ik::update_filter::{FilterChain, UpdateFilter};
use rs_constrained_ik::update_logger::UpdateLogger;
use rs_constrained_ik::utils::{dump_joints, dump_pose, joints};

/// Usage example.
fn main() -> anyhow::Result<()> {
    // A planar arm with three revolute joints, one radian short of a full
    // fold on either side.
    let chain = SerialChain::planar(&[1.0, 0.8, 0.5]).with_limits(&[
        JointLimit::new(-2.2, 2.2),
        JointLimit::new(-2.2, 2.2),
        JointLimit::new(-2.2, 2.2),
    ]);
    let robot = Arc::new(chain);

    let goal = robot.forward(&joints(&[0.4, -0.9, 0.5]))?;
    println!("Goal pose (computed from a known joint configuration):");
    dump_pose(&goal);

    let mut solver = IKSolver::new(SolverConfig::default())?;
    solver.initialize(robot.clone());

    // Primary constraints define success, auxiliary ones shape the solution
    solver.add_constraint(Box::new(GoalPosition::default()), ConstraintTier::Primary);
    solver.add_constraint(Box::new(GoalOrientation::default()), ConstraintTier::Primary);
    solver.add_constraint(Box::new(AvoidJointLimits::default()), ConstraintTier::Auxiliary);
    solver.add_constraint(Box::new(MinimizeChange::default()), ConstraintTier::Auxiliary);

    // The zero seed is fully stretched, a singular pose; damping carries
    // the solver through it.
    let seed = joints(&[0.0, 0.0, 0.0]);
    let solution = solver.solve(&goal, &seed)?;
    println!("Solved in {} iterations:", solver.iterations());
    dump_joints(&solution);
    println!("Reached pose:");
    dump_pose(&robot.forward(&solution)?);

    println!("Same goal through random restarts (for seeds that get stuck):");
    let restart = RandomRestart::new(5);
    let solution = restart.solve(&mut solver, &goal, &joints(&[2.0, -2.0, 2.0]))?;
    dump_joints(&solution);

    // Trajectory updates pass through a filter chain before they are
    // applied: clamp oversized steps, log everything for later inspection.
    let waypoints = 5;
    let mut trajectory = DMatrix::zeros(3, waypoints);
    for c in 0..waypoints {
        let t = c as f64 / (waypoints - 1) as f64;
        for r in 0..3 {
            trajectory[(r, c)] = seed[r] + t * (solution[r] - seed[r]);
        }
    }
    let mut update = DMatrix::zeros(3, waypoints);
    update[(0, 1)] = -0.05;
    update[(1, 2)] = 0.9; // An oversized step for the clamp to catch
    update[(2, 3)] = 0.1;

    let temp = std::env::temp_dir().display().to_string();
    let logger = UpdateLogger::new(&temp, "constrained_ik_updates.log");
    let log_path = logger.path().to_path_buf();

    let mut filters = FilterChain::new();
    filters.add(Box::new(StepClamp::new(0.2)?));
    filters.add(Box::new(logger));

    // Endpoints of the trajectory stay pinned, so the window skips them
    let modified = filters.filter(1, waypoints - 2, 0, &trajectory, &mut update)?;
    println!(
        "Filters modified the update: {} (the 0.9 step is now {})",
        modified,
        update[(1, 2)]
    );
    filters.done(true, 1, 0.0);
    println!("Update log written to {}", log_path.display());

    #[cfg(feature = "allow_filesystem")]
    {
        // This requires YAML library
        use rs_constrained_ik::parameters_from_file::solver_from_yaml_str;
        use rs_constrained_ik::registry::ConstraintRegistry;

        let description = "
solver:
  damping: 0.01
  joint_update_gain: 0.5
constraints:
  - class: goal_position
    primary: true
  - class: goal_orientation
    primary: true
  - class: minimize_change
    primary: false
    weight: 0.5
";
        let registry = ConstraintRegistry::with_builtins();
        let mut from_yaml = solver_from_yaml_str(description, &registry)?;
        from_yaml.initialize(robot.clone());
        let solution = from_yaml.solve(&goal, &seed)?;
        println!(
            "Solver assembled from YAML agrees ({} iterations):",
            from_yaml.iterations()
        );
        dump_joints(&solution);
    }

    Ok(())
}
