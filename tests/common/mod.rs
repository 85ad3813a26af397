#![allow(dead_code)]

use delivery_delay::config::{AppConfig, CrewConfig};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn data_dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn config(&self) -> AppConfig {
        AppConfig {
            data_dir: self.dir.path().to_path_buf(),
            model_path: self.dir.path().join("models").join("model.json"),
            crew: CrewConfig::local(),
        }
    }
}

fn write_all(files: &[(&str, &str)]) -> Fixture {
    let dir = TempDir::new().unwrap();
    for (name, contents) in files {
        fs::write(dir.path().join(name), contents).unwrap();
    }
    Fixture { dir }
}

/// Two orders: A is 30 minutes late with a fuel cost of 100, B is on time with no costs.
pub fn two_orders() -> Fixture {
    write_all(&[
        ("orders.csv", "Order_ID,Order_Date,Priority\nA,2024-01-01,Express\nB,2024-01-02,Standard\n"),
        ("delivery_performance.csv", "Order_ID,Carrier,Traffic_Delay_Minutes\nA,QuickShip,30\nB,EcoDeliver,0\n"),
        ("routes_distance.csv", "Order_ID,Route,Distance_KM\nA,R1,100\nB,R2,50\n"),
        ("cost_breakdown.csv", "Order_ID,Fuel_Cost_INR\nA,100\n"),
        ("vehicle_fleet.csv", "Vehicle_ID,Vehicle_Type\nV1,Small_Van\nV2,Large_Truck\n"),
    ])
}

/// Six orders over three carriers and four days, with enough spread to train on.
pub fn small_history() -> Fixture {
    write_all(&[
        (
            "orders.csv",
            "Order_ID,Order_Date,Priority,Origin\n\
             O1,2024-03-01,Express,Mumbai\n\
             O2,2024-03-01,Standard,Delhi\n\
             O3,2024-03-02,Economy,Pune\n\
             O4,2024-03-03,Express,Chennai\n\
             O5,2024-03-04,Standard,Mumbai\n\
             O6,2024-03-04,Economy,Delhi\n",
        ),
        (
            "delivery_performance.csv",
            "Order_ID,Carrier,Customer_Rating\n\
             O1,SpeedyLogistics,5\n\
             O2,QuickShip,3\n\
             O3,SpeedyLogistics,4\n\
             O4,GlobalTransit,2\n\
             O5,QuickShip,4\n\
             O6,GlobalTransit,1\n",
        ),
        (
            "routes_distance.csv",
            "Order_ID,Route,Distance_KM,Fuel_Consumption_L,Toll_Charges_INR,Traffic_Delay_Minutes,Weather_Impact\n\
             O1,Mumbai-Pune,150,30,200,10,None\n\
             O2,Delhi-Jaipur,280,70,350,45,Fog\n\
             O3,Mumbai-Pune,160,,180,15,Light_Rain\n\
             O4,Chennai-Bangalore,350,90,400,60,Heavy_Rain\n\
             O5,Mumbai-Pune,140,28,150,5,None\n\
             O6,Delhi-Jaipur,300,80,380,50,Fog\n",
        ),
        (
            "cost_breakdown.csv",
            "Order_ID,Fuel_Cost_INR,Labor_Cost_INR,Maintenance_Cost_INR\n\
             O1,900,500,100\n\
             O2,2100,800,150\n\
             O3,1000,520,90\n\
             O4,2700,900,200\n\
             O5,850,480,80\n\
             O6,2400,850,160\n",
        ),
        ("vehicle_fleet.csv", "Vehicle_ID,Vehicle_Type\nV1,Small_Van\n"),
    ])
}
