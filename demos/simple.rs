use gpreg::{optimize, GaussianProcess, OptimizeParams, RbfKernel};
use rand::{rngs::SmallRng, SeedableRng};

pub fn main() {
    let x: Vec<f64> = (0..8).map(|i| i as f64).collect();
    let y: Vec<f64> = x.iter().map(|x| x.sin()).collect();

    let params = OptimizeParams::default()
        .with_iterations(50)
        .with_learning_rate(0.01);
    let t = optimize(&x, &y, 30.0, &params)
        .expect("Data is valid so this should succeed");
    println!("refined precision = {t}");

    let gp = GaussianProcess::train(RbfKernel::new_unchecked(t), &x, &y, 30.0)
        .expect("The refined kernel should still be usable");
    println!("ln_m = {}", gp.ln_m());

    let xt: Vec<f64> = (0..15).map(|i| 0.5 * i as f64).collect();
    let post = gp.predict(&xt);
    for (q, (mu, var)) in xt.iter().zip(post.mean.iter().zip(&post.var)) {
        println!("x = {q:5.2}  mean = {mu:8.4}  var = {var:8.4}");
    }

    let mut rng = SmallRng::seed_from_u64(0xABCD);
    println!("one posterior draw = {:?}", post.draw(&mut rng));
}
