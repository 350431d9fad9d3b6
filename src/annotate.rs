use crate::{
    error::Error,
    landmark::{constants::EDGES, Landmark, LandmarkSet, NUM_LANDMARKS},
};
use num_traits::cast::ToPrimitive;
use opencv::{
    core::{Mat, Point, Scalar, Vector, CV_8UC3},
    imgcodecs,
    imgproc::{FONT_HERSHEY_SIMPLEX, LINE_8, LINE_AA},
    prelude::*,
};
use std::path::Path;

const GREEN: (f64, f64, f64) = (0.0, 255.0, 0.0);
const YELLOW: (f64, f64, f64) = (0.0, 255.0, 255.0);
const WHITE: (f64, f64, f64) = (255.0, 255.0, 255.0);

/// Map a landmark in relative image coordinates onto the pixel grid.
fn to_pixel(landmarks: &LandmarkSet, landmark: Landmark, cols: i32, rows: i32) -> Result<Point, Error> {
    let point = landmarks.get(landmark);
    let x = (point.x * f64::from(cols)).round().to_i32();
    let y = (point.y * f64::from(rows)).round().to_i32();
    match (x, y) {
        (Some(x), Some(y)) => Ok(Point::new(x, y)),
        _ => Err(Error::ConvertLandmarkToPixel(point.x, point.y)),
    }
}

/// Copy of `frame` with the detected skeleton and `label` drawn on it.
pub fn annotate(frame: &Mat, landmarks: &LandmarkSet, label: &str) -> Result<Mat, Error> {
    let mut out = Mat::zeros(frame.rows(), frame.cols(), CV_8UC3)
        .and_then(|expr| expr.to_mat())
        .map_err(Error::CopyFrame)?;
    frame.copy_to(&mut out).map_err(Error::CopyFrame)?;

    let (cols, rows) = (out.cols(), out.rows());
    let mut pixels = [Point::new(0, 0); NUM_LANDMARKS];
    for &landmark in Landmark::ALL.iter() {
        pixels[landmark.idx()] = to_pixel(landmarks, landmark, cols, rows)?;
    }

    for (a, b) in EDGES.iter() {
        opencv::imgproc::line(
            &mut out,
            pixels[a.idx()],
            pixels[b.idx()],
            Scalar::from(YELLOW),
            2,      // thickness
            LINE_8, // line_type
            0,      // shift
        )
        .map_err(Error::DrawLine)?;
    }

    for &pixel in pixels.iter() {
        opencv::imgproc::circle(
            &mut out,
            pixel,
            6,
            Scalar::from(GREEN),
            1,      // thickness
            LINE_8, // line_type
            0,      // shift
        )
        .map_err(Error::DrawCircle)?;
    }

    opencv::imgproc::put_text(
        &mut out,
        label,
        Point::new(10, 30),
        FONT_HERSHEY_SIMPLEX,
        0.8,
        Scalar::from(WHITE),
        2,       // thickness
        LINE_AA, // line_type
        false,   // bottom_left_origin
    )
    .map_err(Error::PutText)?;

    Ok(out)
}

pub fn write_image(path: &Path, image: &Mat) -> Result<(), Error> {
    let path_str = path
        .to_str()
        .ok_or_else(|| Error::GetPathAsStr(path.to_path_buf()))?;
    let written = imgcodecs::imwrite(path_str, image, &Vector::<i32>::new())
        .map_err(|e| Error::WriteImage(e, path.to_path_buf()))?;
    if written {
        Ok(())
    } else {
        Err(Error::EncodeImage(path.to_path_buf()))
    }
}
