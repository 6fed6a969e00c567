//Detect maximally stable extremal regions in an image file

use clap::Parser;
use mser::{utils::read_gray_image, Mser, MserParameter};
use ndarray_npy::write_npy;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    //path to an image file, converted to gray levels
    #[arg(short, long)]
    image_path: String,

    #[arg(long, default_value_t = 10)]
    delta: usize,

    #[arg(long, default_value_t = 10)]
    min_area: usize,

    #[arg(long, default_value_t = 100000)]
    max_area: usize,

    #[arg(long, default_value_t = 10.0)]
    max_variation: f64,

    #[arg(long, default_value_t = 0.5)]
    min_diversity: f64,

    //also search for bright regions on dark background
    #[arg(long)]
    bright_to_dark: bool,

    //write the heat map as .npy
    #[arg(long)]
    heat_map: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let image = read_gray_image(&args.image_path)?;
    let dimensions = [image.width() as usize, image.height() as usize];

    let param = MserParameter::new(
        args.delta,
        args.min_area,
        args.max_area,
        args.max_variation,
        args.min_diversity,
    )
    .with_directions(true, args.bright_to_dark)
    .with_perimeter(true);
    println!("parameters: {}", param);

    let mut heat_map = mser::HeatMap::new(&dimensions);
    let mut detector = Mser::new(&dimensions, param);
    let tree = detector.process(&image, Some(&mut heat_map))?;

    for region in tree.iter() {
        println!(
            "{} ({}), perimeter: {}, parent: {:?}",
            region, region.polarity, region.perimeter, region.parent
        );
    }
    println!(
        "{} regions, {} top level",
        tree.len(),
        tree.top_level_ids().len()
    );

    if let Some(path) = args.heat_map {
        write_npy(&path, &heat_map.to_array()?)?;
    }
    Ok(())
}
