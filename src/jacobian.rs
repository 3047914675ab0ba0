extern crate nalgebra as na;
use na::linalg::SVD;
use na::{DMatrix, DVector, Matrix6xX};
use rayon::prelude::*;
use crate::errors::IkError;
use crate::kinematic_traits::{Joints, Kinematics};

/// Singular values below this are treated as zero when the pseudoinverse
/// fallback has to run.
const PINV_EPSILON: f64 = 1e-10;

/// Solves the damped normal equations `(J^T J + lambda I) delta = J^T error`
/// for the joint step `delta`.
///
/// With a positive `damping` the system matrix is positive definite and the
/// Cholesky path cannot fail; a pseudoinverse fallback still covers extreme
/// conditioning. With `damping` zero the solve is the plain least squares
/// step and fails with `SingularJacobian` when the stacked Jacobian is rank
/// deficient.
pub fn damped_least_squares(
    jacobian: &DMatrix<f64>,
    error: &DVector<f64>,
    damping: f64,
) -> Result<DVector<f64>, IkError> {
    if error.len() != jacobian.nrows() {
        return Err(IkError::DimensionMismatch {
            expected: jacobian.nrows(),
            found: error.len(),
        });
    }

    let jt = jacobian.transpose();
    let mut normal = &jt * jacobian;
    let rhs = &jt * error;
    if damping > 0.0 {
        for i in 0..normal.nrows() {
            normal[(i, i)] += damping;
        }
    }

    if let Some(factor) = normal.clone().cholesky() {
        return Ok(factor.solve(&rhs));
    }

    if damping <= 0.0 {
        // Rank deficient and nothing to regularize it with
        return Err(IkError::SingularJacobian);
    }

    // If the factorization does not exist, use the pseudoinverse
    let svd = SVD::new(normal, true, true);
    match svd.pseudo_inverse(PINV_EPSILON) {
        Ok(pseudoinverse) => Ok(pseudoinverse * rhs),
        Err(_) => Err(IkError::SingularJacobian),
    }
}

/// Computes the tip Jacobian by numerical differentiation, one column per
/// joint: perturb the joint by `epsilon`, run forward kinematics and divide
/// the pose delta by `epsilon`. Columns are computed in parallel.
///
/// The analytic Jacobian of `SerialChain` is cheaper; this exists for
/// validating custom `Kinematics` implementations and for chains that have
/// no analytic form.
pub fn numerical_jacobian<K: Kinematics + ?Sized>(
    robot: &K,
    joints: &Joints,
    epsilon: f64,
) -> Result<Matrix6xX<f64>, IkError> {
    let dof = robot.dof();
    let current_pose = robot.forward(joints)?;
    let current_position = current_pose.translation.vector;
    let current_orientation = current_pose.rotation;

    // Parallelize the loop using rayon
    let jacobian_columns: Vec<_> = (0..dof)
        .into_par_iter()
        .map(|i| {
            let mut perturbed_qs = joints.clone();
            perturbed_qs[i] += epsilon;
            let perturbed_pose = robot.forward(&perturbed_qs)?;
            let perturbed_position = perturbed_pose.translation.vector;
            let perturbed_orientation = perturbed_pose.rotation;

            let delta_position = (perturbed_position - current_position) / epsilon;
            let delta_orientation =
                (perturbed_orientation * current_orientation.inverse()).scaled_axis() / epsilon;

            Ok((delta_position, delta_orientation))
        })
        .collect::<Result<Vec<_>, IkError>>()?;

    let mut jacobian = Matrix6xX::zeros(dof);
    for (i, (delta_position, delta_orientation)) in jacobian_columns.into_iter().enumerate() {
        jacobian.fixed_view_mut::<3, 1>(0, i).copy_from(&delta_position);
        jacobian.fixed_view_mut::<3, 1>(3, i).copy_from(&delta_orientation);
    }

    Ok(jacobian)
}
